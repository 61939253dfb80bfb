//! `SeaORM` Entity for chit_memberships table
//!
//! A membership is one slot of a chit group; slot_number is unique per group.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chit_memberships")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub chit_id: i32,
    pub member_id: i32,
    pub slot_number: i32,
    pub join_date: DateTimeWithTimeZone,
    pub is_active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::chits::Entity",
        from = "Column::ChitId",
        to = "super::chits::Column::Id"
    )]
    Chits,
    #[sea_orm(
        belongs_to = "super::members::Entity",
        from = "Column::MemberId",
        to = "super::members::Column::Id"
    )]
    Members,
}

impl Related<super::chits::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chits.def()
    }
}

impl Related<super::members::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
