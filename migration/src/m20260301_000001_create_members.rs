//! Members are soft-deactivated, never deleted, so ledger history stays attributable.

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(pk_auto(Members::Id))
                    .col(string_len(Members::Name, 100).not_null())
                    .col(string_len(Members::Phone, 15).not_null().unique_key())
                    .col(string_len_null(Members::Email, 100))
                    .col(text_null(Members::Address))
                    .col(boolean(Members::IsActive).default(true))
                    .col(timestamp_with_time_zone(Members::CreatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Members {
    Table,
    Id,
    Name,
    Phone,
    Email,
    Address,
    IsActive,
    CreatedAt,
}
