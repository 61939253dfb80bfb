//! Monthly reverse auctions and their bids.

use sea_orm_migration::{prelude::*, schema::*};

use super::m20260301_000001_create_members::Members;
use super::m20260301_000002_create_chits::ChitMonths;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Auctions::Table)
                    .if_not_exists()
                    .col(pk_auto(Auctions::Id))
                    .col(integer(Auctions::ChitMonthId).not_null())
                    .col(timestamp_with_time_zone(Auctions::AuctionDate).not_null())
                    .col(string_len(Auctions::Status, 16).not_null().default("scheduled"))
                    .col(decimal_len_null(Auctions::WinningBidAmount, 12, 2))
                    .col(integer_null(Auctions::WinnerMemberId))
                    .col(decimal_len_null(Auctions::DividendPerMember, 12, 2))
                    .col(timestamp_with_time_zone(Auctions::CreatedAt).default(Expr::current_timestamp()))
                    .col(timestamp_with_time_zone(Auctions::UpdatedAt).default(Expr::current_timestamp()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auctions_chit_month")
                            .from(Auctions::Table, Auctions::ChitMonthId)
                            .to(ChitMonths::Table, ChitMonths::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auctions_winner")
                            .from(Auctions::Table, Auctions::WinnerMemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one auction per chit month
        manager
            .create_index(
                Index::create()
                    .name("idx_auctions_chit_month")
                    .table(Auctions::Table)
                    .col(Auctions::ChitMonthId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Bids::Table)
                    .if_not_exists()
                    .col(pk_auto(Bids::Id))
                    .col(integer(Bids::AuctionId).not_null())
                    .col(integer(Bids::MemberId).not_null())
                    .col(decimal_len(Bids::BidAmount, 12, 2).not_null())
                    .col(timestamp_with_time_zone(Bids::BidTime).default(Expr::current_timestamp()))
                    .col(string_len(Bids::Status, 16).not_null().default("active"))
                    .col(string_len_null(Bids::Notes, 500))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bids_auction")
                            .from(Bids::Table, Bids::AuctionId)
                            .to(Auctions::Table, Auctions::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bids_member")
                            .from(Bids::Table, Bids::MemberId)
                            .to(Members::Table, Members::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bids_auction")
                    .table(Bids::Table)
                    .col(Bids::AuctionId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bids::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Auctions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Auctions {
    Table,
    Id,
    ChitMonthId,
    AuctionDate,
    Status,
    WinningBidAmount,
    WinnerMemberId,
    DividendPerMember,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Bids {
    Table,
    Id,
    AuctionId,
    MemberId,
    BidAmount,
    BidTime,
    Status,
    Notes,
}
