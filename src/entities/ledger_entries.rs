//! `SeaORM` Entity for ledger_entries table
//!
//! Append-only: rows are inserted, never updated or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{EntryType, LedgerSource};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub member_id: i32,
    pub chit_id: i32,
    /// None for advance credits not yet tied to a month
    pub month_number: Option<i32>,
    pub entry_type: EntryType,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub amount: Decimal,
    pub source: LedgerSource,
    pub due_date: Option<Date>,
    pub reference_id: Option<i32>,
    pub reference_type: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id"
    )]
    Members,
    #[sea_orm(
        belongs_to = "super::chits::Entity",
        from = "Column::ChitId",
        to = "super::chits::Column::Id"
    )]
    Chits,
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl Related<super::chits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chits.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
