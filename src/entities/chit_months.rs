//! `SeaORM` Entity for chit_months table
//!
//! Only the auction close / month-result paths move `status` to completed.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::ChitMonthStatus;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chit_months")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub chit_id: i32,
    pub month_number: i32,
    pub status: ChitMonthStatus,
    pub auction_date: Option<Date>,
    pub winner_member_id: Option<i32>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub payout_amount: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
    pub admin_profit: Option<Decimal>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chits::Entity",
        from = "Column::ChitId",
        to = "super::chits::Column::Id"
    )]
    Chits,
    #[sea_orm(has_many = "super::auctions::Entity")]
    Auctions,
}

impl Related<super::chits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chits.def()
    }
}

impl Related<super::auctions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Auctions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
