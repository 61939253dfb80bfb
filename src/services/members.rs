//! Member registry. Members are soft-deactivated, never deleted, so their
//! ledger history stays attributable.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::{chit_memberships, members, prelude::*};
use crate::error::{ApiError, ApiResult};
use crate::models::member::CreateMemberRequest;

pub async fn create_member(
    db: &DatabaseConnection,
    req: CreateMemberRequest,
) -> ApiResult<members::Model> {
    req.validate().map_err(ApiError::Validation)?;

    let phone = req.phone.trim().to_string();
    let clash = Members::find()
        .filter(members::Column::Phone.eq(phone.as_str()))
        .one(db)
        .await?;
    if clash.is_some() {
        return Err(ApiError::validation(format!(
            "a member with phone {} already exists",
            phone
        )));
    }

    let member = members::ActiveModel {
        name: Set(req.name.trim().to_string()),
        phone: Set(phone),
        email: Set(req.email.filter(|e| !e.trim().is_empty())),
        address: Set(req.address),
        is_active: Set(true),
        created_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(member_id = member.id, name = %member.name, "Member created");
    Ok(member)
}

pub async fn list_members(
    db: &DatabaseConnection,
    active: Option<bool>,
) -> ApiResult<Vec<members::Model>> {
    let mut query = Members::find();
    if let Some(active) = active {
        query = query.filter(members::Column::IsActive.eq(active));
    }
    Ok(query.order_by_asc(members::Column::Name).all(db).await?)
}

/// Load a member or fail with `NotFound`
pub async fn find_member<C: ConnectionTrait>(db: &C, member_id: i32) -> ApiResult<members::Model> {
    Members::find_by_id(member_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("member {} not found", member_id)))
}

/// Idempotent: deactivating an inactive member returns it unchanged.
/// The member's chit slots are released along with it, so later dues and
/// dividend splits leave them out.
pub async fn deactivate_member(
    db: &DatabaseConnection,
    member_id: i32,
) -> ApiResult<members::Model> {
    let txn = db.begin().await?;

    let member = find_member(&txn, member_id).await?;
    if !member.is_active {
        return Ok(member);
    }

    let mut active: members::ActiveModel = member.into();
    active.is_active = Set(false);
    let member = active.update(&txn).await?;

    let released = ChitMemberships::update_many()
        .set(chit_memberships::ActiveModel {
            is_active: Set(false),
            ..Default::default()
        })
        .filter(chit_memberships::Column::MemberId.eq(member_id))
        .filter(chit_memberships::Column::IsActive.eq(true))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(
        member_id,
        memberships = released.rows_affected,
        "Member deactivated"
    );
    Ok(member)
}
