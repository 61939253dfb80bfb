//! `SeaORM` Entity for auctions table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::AuctionStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auctions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub chit_month_id: i32,
    pub auction_date: DateTimeWithTimeZone,
    pub status: AuctionStatus,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub winning_bid_amount: Option<Decimal>,
    pub winner_member_id: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub dividend_per_member: Option<Decimal>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chit_months::Entity",
        from = "Column::ChitMonthId",
        to = "super::chit_months::Column::Id"
    )]
    ChitMonths,
    #[sea_orm(has_many = "super::bids::Entity")]
    Bids,
}

impl Related<super::chit_months::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChitMonths.def()
    }
}

impl Related<super::bids::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bids.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
