//! Chit groups, their slot memberships and the per-month auction slots.

use sea_orm_migration::{prelude::*, schema::*};

use super::m20260301_000001_create_members::Members;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Chits::Table)
                    .if_not_exists()
                    .col(pk_auto(Chits::Id))
                    .col(string_len(Chits::Name, 100).not_null())
                    .col(decimal_len(Chits::TotalAmount, 12, 2).not_null())
                    .col(integer(Chits::TotalMonths).not_null())
                    .col(decimal_len(Chits::MonthlyAmount, 12, 2).not_null())
                    .col(date_null(Chits::StartDate))
                    .col(boolean(Chits::IsActive).default(true))
                    .col(timestamp_with_time_zone(Chits::CreatedAt).default(Expr::current_timestamp()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChitMemberships::Table)
                    .if_not_exists()
                    .col(pk_auto(ChitMemberships::Id))
                    .col(integer(ChitMemberships::ChitId).not_null())
                    .col(integer(ChitMemberships::MemberId).not_null())
                    .col(integer(ChitMemberships::SlotNumber).not_null())
                    .col(timestamp_with_time_zone(ChitMemberships::JoinDate).default(Expr::current_timestamp()))
                    .col(boolean(ChitMemberships::IsActive).default(true))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chit_memberships_chit")
                            .from(ChitMemberships::Table, ChitMemberships::ChitId)
                            .to(Chits::Table, Chits::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chit_memberships_member")
                            .from(ChitMemberships::Table, ChitMemberships::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One holder per slot
        manager
            .create_index(
                Index::create()
                    .name("idx_chit_memberships_chit_slot")
                    .table(ChitMemberships::Table)
                    .col(ChitMemberships::ChitId)
                    .col(ChitMemberships::SlotNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chit_memberships_chit_member")
                    .table(ChitMemberships::Table)
                    .col(ChitMemberships::ChitId)
                    .col(ChitMemberships::MemberId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChitMonths::Table)
                    .if_not_exists()
                    .col(pk_auto(ChitMonths::Id))
                    .col(integer(ChitMonths::ChitId).not_null())
                    .col(integer(ChitMonths::MonthNumber).not_null())
                    .col(string_len(ChitMonths::Status, 16).not_null().default("pending"))
                    .col(date_null(ChitMonths::AuctionDate))
                    .col(integer_null(ChitMonths::WinnerMemberId))
                    .col(decimal_len_null(ChitMonths::PayoutAmount, 12, 2))
                    .col(decimal_len_null(ChitMonths::AdminProfit, 12, 2))
                    .col(timestamp_with_time_zone(ChitMonths::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chit_months_chit")
                            .from(ChitMonths::Table, ChitMonths::ChitId)
                            .to(Chits::Table, Chits::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_chit_months_winner")
                            .from(ChitMonths::Table, ChitMonths::WinnerMemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_chit_months_chit_month")
                    .table(ChitMonths::Table)
                    .col(ChitMonths::ChitId)
                    .col(ChitMonths::MonthNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ChitMonths::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChitMemberships::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Chits::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Chits {
    Table,
    Id,
    Name,
    TotalAmount,
    TotalMonths,
    MonthlyAmount,
    StartDate,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ChitMemberships {
    Table,
    Id,
    ChitId,
    MemberId,
    SlotNumber,
    JoinDate,
    IsActive,
}

#[derive(DeriveIden)]
pub enum ChitMonths {
    Table,
    Id,
    ChitId,
    MonthNumber,
    Status,
    AuctionDate,
    WinnerMemberId,
    PayoutAmount,
    AdminProfit,
    CreatedAt,
}
