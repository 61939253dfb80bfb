//! `SeaORM` Entity for chits table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total_amount: Decimal,
    pub total_months: i32,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub monthly_amount: Decimal,
    pub start_date: Option<Date>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::chit_memberships::Entity")]
    ChitMemberships,
    #[sea_orm(has_many = "super::chit_months::Entity")]
    ChitMonths,
}

impl Related<super::chit_memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChitMemberships.def()
    }
}

impl Related<super::chit_months::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChitMonths.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
