//! `SeaORM` Entity for members table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    #[sea_orm(unique)]
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::chit_memberships::Entity")]
    ChitMemberships,
}

impl Related<super::chit_memberships::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChitMemberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
