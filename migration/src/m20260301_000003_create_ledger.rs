//! Append-only ledger plus the payment records that produce its credits.
//!
//! Ledger rows are never updated or deleted; corrections are new `adjustment` rows.

use sea_orm_migration::{prelude::*, schema::*};

use super::m20260301_000001_create_members::Members;
use super::m20260301_000002_create_chits::Chits;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(pk_auto(Payments::Id))
                    .col(integer(Payments::MemberId).not_null())
                    .col(integer(Payments::ChitId).not_null())
                    .col(decimal_len(Payments::Amount, 12, 2).not_null())
                    .col(string_len(Payments::Mode, 16).not_null().default("cash"))
                    .col(text_null(Payments::Notes))
                    .col(timestamp_with_time_zone(Payments::PaidAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_member")
                            .from(Payments::Table, Payments::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_payments_chit")
                            .from(Payments::Table, Payments::ChitId)
                            .to(Chits::Table, Chits::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LedgerEntries::Table)
                    .if_not_exists()
                    .col(pk_auto(LedgerEntries::Id))
                    .col(integer(LedgerEntries::MemberId).not_null())
                    .col(integer(LedgerEntries::ChitId).not_null())
                    .col(integer_null(LedgerEntries::MonthNumber))
                    .col(string_len(LedgerEntries::EntryType, 16).not_null())
                    .col(decimal_len(LedgerEntries::Amount, 12, 2).not_null())
                    .col(string_len(LedgerEntries::Source, 16).not_null())
                    .col(date_null(LedgerEntries::DueDate))
                    .col(integer_null(LedgerEntries::ReferenceId))
                    .col(string_len_null(LedgerEntries::ReferenceType, 32))
                    .col(text_null(LedgerEntries::Notes))
                    .col(timestamp_with_time_zone(LedgerEntries::CreatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_entries_member")
                            .from(LedgerEntries::Table, LedgerEntries::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ledger_entries_chit")
                            .from(LedgerEntries::Table, LedgerEntries::ChitId)
                            .to(Chits::Table, Chits::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Reconciliation scans member + chit + month
        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_member_chit_month")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::MemberId)
                    .col(LedgerEntries::ChitId)
                    .col(LedgerEntries::MonthNumber)
                    .to_owned(),
            )
            .await?;

        // Ledger pages are newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_ledger_entries_created_at")
                    .table(LedgerEntries::Table)
                    .col(LedgerEntries::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LedgerEntries::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Payments {
    Table,
    Id,
    MemberId,
    ChitId,
    Amount,
    Mode,
    Notes,
    PaidAt,
}

#[derive(DeriveIden)]
enum LedgerEntries {
    Table,
    Id,
    MemberId,
    ChitId,
    MonthNumber,
    EntryType,
    Amount,
    Source,
    DueDate,
    ReferenceId,
    ReferenceType,
    Notes,
    CreatedAt,
}
