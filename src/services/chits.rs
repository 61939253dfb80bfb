//! Chit groups, their member slots and their months.

use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};

use crate::entities::prelude::*;
use crate::entities::sea_orm_active_enums::{
    AuctionStatus, ChitMonthStatus, EntryType, LedgerSource,
};
use crate::entities::{auctions, chit_memberships, chit_months, chits, ledger_entries, members};
use crate::error::{ApiError, ApiResult};
use crate::models::chit::{
    AddMembershipRequest, ChitMonthListResponse, ChitMonthResponse, ChitResponse,
    CreateChitRequest, MembershipListResponse, MembershipResponse, RecordMonthResultRequest,
};
use crate::services::chit_math;
use crate::services::members::find_member;

pub async fn create_chit(db: &DatabaseConnection, req: CreateChitRequest) -> ApiResult<ChitResponse> {
    req.validate().map_err(ApiError::Validation)?;

    let monthly_amount =
        chit_math::monthly_amount(req.total_amount, req.total_months).map_err(ApiError::Validation)?;
    if !chit_math::within_tolerance(req.total_amount, req.total_months, monthly_amount) {
        return Err(ApiError::validation(format!(
            "{} cannot be split into {} instalments",
            req.total_amount, req.total_months
        )));
    }

    let now = Utc::now().fixed_offset();
    let txn = db.begin().await?;

    let chit = chits::ActiveModel {
        name: Set(req.name.trim().to_string()),
        total_amount: Set(req.total_amount),
        total_months: Set(req.total_months),
        monthly_amount: Set(monthly_amount),
        start_date: Set(req.start_date),
        is_active: Set(true),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let months = (1..=chit.total_months).map(|month_number| chit_months::ActiveModel {
        chit_id: Set(chit.id),
        month_number: Set(month_number),
        status: Set(ChitMonthStatus::Pending),
        created_at: Set(now),
        ..Default::default()
    });
    ChitMonths::insert_many(months).exec(&txn).await?;

    txn.commit().await?;

    info!(
        chit_id = chit.id,
        total_amount = %chit.total_amount,
        total_months = chit.total_months,
        monthly_amount = %chit.monthly_amount,
        "Chit group created"
    );
    Ok(ChitResponse::from_model(chit, 0))
}

pub async fn list_chits(db: &DatabaseConnection, active: Option<bool>) -> ApiResult<Vec<ChitResponse>> {
    let mut query = Chits::find();
    if let Some(active) = active {
        query = query.filter(chits::Column::IsActive.eq(active));
    }
    let chits = query.order_by_desc(chits::Column::CreatedAt).all(db).await?;

    let memberships = ChitMemberships::find()
        .filter(chit_memberships::Column::IsActive.eq(true))
        .all(db)
        .await?;
    let mut counts: HashMap<i32, u64> = HashMap::new();
    for membership in &memberships {
        *counts.entry(membership.chit_id).or_default() += 1;
    }

    Ok(chits
        .into_iter()
        .map(|chit| {
            let count = counts.get(&chit.id).copied().unwrap_or(0);
            ChitResponse::from_model(chit, count)
        })
        .collect())
}

pub async fn get_chit(db: &DatabaseConnection, chit_id: i32) -> ApiResult<ChitResponse> {
    let chit = find_chit(db, chit_id).await?;
    let count = member_count(db, chit_id).await?;
    Ok(ChitResponse::from_model(chit, count))
}

pub async fn find_chit<C: ConnectionTrait>(db: &C, chit_id: i32) -> ApiResult<chits::Model> {
    Chits::find_by_id(chit_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("chit {} not found", chit_id)))
}

/// Active members holding a slot in the group
pub async fn member_count<C: ConnectionTrait>(db: &C, chit_id: i32) -> ApiResult<u64> {
    Ok(ChitMemberships::find()
        .filter(chit_memberships::Column::ChitId.eq(chit_id))
        .filter(chit_memberships::Column::IsActive.eq(true))
        .count(db)
        .await?)
}

pub async fn find_membership<C: ConnectionTrait>(
    db: &C,
    chit_id: i32,
    member_id: i32,
) -> ApiResult<Option<chit_memberships::Model>> {
    Ok(ChitMemberships::find()
        .filter(chit_memberships::Column::ChitId.eq(chit_id))
        .filter(chit_memberships::Column::MemberId.eq(member_id))
        .filter(chit_memberships::Column::IsActive.eq(true))
        .one(db)
        .await?)
}

pub async fn add_membership(
    db: &DatabaseConnection,
    chit_id: i32,
    req: AddMembershipRequest,
) -> ApiResult<MembershipResponse> {
    let txn = db.begin().await?;

    let chit = find_chit(&txn, chit_id).await?;
    if !chit.is_active {
        return Err(ApiError::invalid_state(format!(
            "chit {} is no longer active",
            chit_id
        )));
    }
    if req.slot_number < 1 || req.slot_number > chit.total_months {
        return Err(ApiError::validation(format!(
            "slot_number must be between 1 and {}",
            chit.total_months
        )));
    }

    let member = find_member(&txn, req.member_id).await?;
    if !member.is_active {
        return Err(ApiError::validation(format!(
            "member {} is inactive",
            member.id
        )));
    }

    let existing = ChitMemberships::find()
        .filter(chit_memberships::Column::ChitId.eq(chit_id))
        .all(&txn)
        .await?;
    if existing.iter().any(|m| m.member_id == member.id) {
        return Err(ApiError::validation(format!(
            "member {} already belongs to chit {}",
            member.id, chit_id
        )));
    }
    if existing.iter().any(|m| m.slot_number == req.slot_number) {
        return Err(ApiError::validation(format!(
            "slot {} is already taken",
            req.slot_number
        )));
    }
    let active_slots = existing.iter().filter(|m| m.is_active).count();
    if i32::try_from(active_slots).unwrap_or(i32::MAX) >= chit.total_months {
        return Err(ApiError::validation(format!(
            "chit {} already has {} members",
            chit_id, chit.total_months
        )));
    }

    let membership = chit_memberships::ActiveModel {
        chit_id: Set(chit_id),
        member_id: Set(member.id),
        slot_number: Set(req.slot_number),
        join_date: Set(Utc::now().fixed_offset()),
        is_active: Set(true),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        chit_id,
        member_id = member.id,
        slot = membership.slot_number,
        "Member added to chit"
    );
    Ok(MembershipResponse::new(membership, member.name, member.phone))
}

/// Take a member out of a chit. The row is kept, inactive, so the slot
/// and the member's ledger history stay attributable.
pub async fn remove_membership(
    db: &DatabaseConnection,
    chit_id: i32,
    member_id: i32,
) -> ApiResult<MembershipResponse> {
    let txn = db.begin().await?;

    find_chit(&txn, chit_id).await?;
    let member = find_member(&txn, member_id).await?;
    let membership = find_membership(&txn, chit_id, member_id)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("member {} is not in chit {}", member_id, chit_id))
        })?;

    let mut removing: chit_memberships::ActiveModel = membership.into();
    removing.is_active = Set(false);
    let membership = removing.update(&txn).await?;

    txn.commit().await?;

    info!(
        chit_id,
        member_id,
        slot = membership.slot_number,
        "Member removed from chit"
    );
    Ok(MembershipResponse::new(membership, member.name, member.phone))
}

pub async fn list_memberships(
    db: &DatabaseConnection,
    chit_id: i32,
) -> ApiResult<MembershipListResponse> {
    let chit = find_chit(db, chit_id).await?;

    let memberships = ChitMemberships::find()
        .filter(chit_memberships::Column::ChitId.eq(chit_id))
        .order_by_asc(chit_memberships::Column::SlotNumber)
        .all(db)
        .await?;
    let names = member_names(db, memberships.iter().map(|m| m.member_id)).await?;

    let members = memberships
        .into_iter()
        .map(|membership| {
            let (name, phone) = names.get(&membership.member_id).cloned().unwrap_or_default();
            MembershipResponse::new(membership, name, phone)
        })
        .collect();

    Ok(MembershipListResponse {
        chit_id,
        chit_name: chit.name,
        total_slots: chit.total_months,
        members,
    })
}

/// id -> (name, phone) for the given members
pub async fn member_names<C, I>(db: &C, ids: I) -> ApiResult<HashMap<i32, (String, String)>>
where
    C: ConnectionTrait,
    I: IntoIterator<Item = i32>,
{
    let ids: Vec<i32> = ids.into_iter().collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = Members::find()
        .filter(members::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|m| (m.id, (m.name, m.phone))).collect())
}

pub async fn list_months(db: &DatabaseConnection, chit_id: i32) -> ApiResult<ChitMonthListResponse> {
    let chit = find_chit(db, chit_id).await?;

    let months = ChitMonths::find()
        .filter(chit_months::Column::ChitId.eq(chit_id))
        .order_by_asc(chit_months::Column::MonthNumber)
        .all(db)
        .await?;

    let collected = collected_by_month(db, chit_id).await?;

    let months = months
        .into_iter()
        .map(|month| {
            let total = collected.get(&month.month_number).copied().unwrap_or_default();
            ChitMonthResponse::new(month, total)
        })
        .collect();

    Ok(ChitMonthListResponse {
        chit_id,
        chit_name: chit.name,
        total_months: chit.total_months,
        months,
    })
}

/// Payment credits booked against each month of a chit
pub async fn collected_by_month<C: ConnectionTrait>(
    db: &C,
    chit_id: i32,
) -> ApiResult<HashMap<i32, Decimal>> {
    let credits = LedgerEntries::find()
        .filter(ledger_entries::Column::ChitId.eq(chit_id))
        .filter(ledger_entries::Column::EntryType.eq(EntryType::Credit))
        .all(db)
        .await?;

    let mut collected: HashMap<i32, Decimal> = HashMap::new();
    for entry in credits.iter().filter(|e| e.source.is_collection()) {
        if let Some(month_number) = entry.month_number {
            *collected.entry(month_number).or_default() += entry.amount;
        }
    }
    Ok(collected)
}

pub async fn find_month<C: ConnectionTrait>(
    db: &C,
    chit_id: i32,
    month_number: i32,
) -> ApiResult<chit_months::Model> {
    ChitMonths::find()
        .filter(chit_months::Column::ChitId.eq(chit_id))
        .filter(chit_months::Column::MonthNumber.eq(month_number))
        .one(db)
        .await?
        .ok_or_else(|| {
            ApiError::not_found(format!("month {} of chit {} not found", month_number, chit_id))
        })
}

/// The result that completes a month, from an auction close or a manual record
#[derive(Debug, Clone)]
pub struct MonthOutcome {
    pub winner_member_id: i32,
    pub auction_date: NaiveDate,
    pub payout_amount: Decimal,
    pub admin_profit: Decimal,
    pub reference_id: i32,
    pub reference_type: &'static str,
}

/// Mark a pending month completed and append its payout and commission
/// credits. Must run inside the caller's transaction. Deactivates the
/// chit once its last month completes.
pub async fn complete_month<C: ConnectionTrait>(
    db: &C,
    chit: &chits::Model,
    month: &chit_months::Model,
    outcome: &MonthOutcome,
) -> ApiResult<(chit_months::Model, Vec<i32>)> {
    if outcome.payout_amount <= Decimal::ZERO || outcome.admin_profit <= Decimal::ZERO {
        return Err(ApiError::validation(format!(
            "month {} needs a positive payout and admin profit, got {} and {}",
            month.month_number, outcome.payout_amount, outcome.admin_profit
        )));
    }

    let completed = ChitMonths::update_many()
        .set(chit_months::ActiveModel {
            status: Set(ChitMonthStatus::Completed),
            auction_date: Set(Some(outcome.auction_date)),
            winner_member_id: Set(Some(outcome.winner_member_id)),
            payout_amount: Set(Some(outcome.payout_amount)),
            admin_profit: Set(Some(outcome.admin_profit)),
            ..Default::default()
        })
        .filter(chit_months::Column::Id.eq(month.id))
        .filter(chit_months::Column::Status.eq(ChitMonthStatus::Pending))
        .exec(db)
        .await?;
    if completed.rows_affected == 0 {
        return Err(ApiError::invalid_state(format!(
            "month {} of chit {} is already completed",
            month.month_number, chit.id
        )));
    }

    let now = Utc::now().fixed_offset();
    let credit = |amount: Decimal, notes: String| ledger_entries::ActiveModel {
        member_id: Set(outcome.winner_member_id),
        chit_id: Set(chit.id),
        month_number: Set(Some(month.month_number)),
        entry_type: Set(EntryType::Credit),
        amount: Set(amount),
        source: Set(LedgerSource::Auction),
        due_date: Set(None),
        reference_id: Set(Some(outcome.reference_id)),
        reference_type: Set(Some(outcome.reference_type.to_string())),
        notes: Set(Some(notes)),
        created_at: Set(now),
        ..Default::default()
    };

    let payout = credit(
        outcome.payout_amount,
        format!("Payout for month {}", month.month_number),
    )
    .insert(db)
    .await?;
    let commission = credit(
        outcome.admin_profit,
        format!("Admin commission for month {}", month.month_number),
    )
    .insert(db)
    .await?;

    let remaining = ChitMonths::find()
        .filter(chit_months::Column::ChitId.eq(chit.id))
        .filter(chit_months::Column::Status.eq(ChitMonthStatus::Pending))
        .count(db)
        .await?;
    if remaining == 0 {
        let mut closing: chits::ActiveModel = chit.clone().into();
        closing.is_active = Set(false);
        closing.update(db).await?;
        info!(chit_id = chit.id, "Last month completed, chit closed");
    }

    let month = ChitMonths::find_by_id(month.id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("chit month {} not found", month.id)))?;

    Ok((month, vec![payout.id, commission.id]))
}

/// Record a month's result without running an auction
pub async fn record_month_result(
    db: &DatabaseConnection,
    commission_rate: Decimal,
    chit_id: i32,
    month_number: i32,
    req: RecordMonthResultRequest,
) -> ApiResult<ChitMonthResponse> {
    let txn = db.begin().await?;

    let chit = find_chit(&txn, chit_id).await?;
    let month = find_month(&txn, chit_id, month_number).await?;
    if month.status == ChitMonthStatus::Completed {
        return Err(ApiError::invalid_state(format!(
            "month {} of chit {} is already completed",
            month_number, chit_id
        )));
    }

    let live_auction = Auctions::find()
        .filter(auctions::Column::ChitMonthId.eq(month.id))
        .filter(auctions::Column::Status.is_in([AuctionStatus::Scheduled, AuctionStatus::Open]))
        .one(&txn)
        .await?;
    if let Some(auction) = live_auction {
        warn!(chit_id, month_number, auction_id = auction.id, "Manual record blocked by auction");
        return Err(ApiError::invalid_state(format!(
            "month {} has auction {} in progress; close or cancel it first",
            month_number, auction.id
        )));
    }

    req.validate(chit.total_amount).map_err(ApiError::Validation)?;

    let winner = find_member(&txn, req.winner_member_id).await?;
    if !winner.is_active {
        return Err(ApiError::validation(format!("member {} is inactive", winner.id)));
    }
    if find_membership(&txn, chit_id, winner.id).await?.is_none() {
        return Err(ApiError::validation(format!(
            "member {} is not in chit {}",
            winner.id, chit_id
        )));
    }

    let outcome = MonthOutcome {
        winner_member_id: winner.id,
        auction_date: req.auction_date,
        payout_amount: req.payout_amount,
        admin_profit: req
            .admin_profit
            .unwrap_or_else(|| chit_math::commission(chit.total_amount, commission_rate)),
        reference_id: month.id,
        reference_type: "chit_month",
    };
    let (month, _) = complete_month(&txn, &chit, &month, &outcome).await?;
    let collected = collected_by_month(&txn, chit_id).await?;

    txn.commit().await?;

    info!(
        chit_id,
        month_number,
        winner = winner.id,
        payout = %outcome.payout_amount,
        admin_profit = %outcome.admin_profit,
        "Month result recorded"
    );
    let total = collected.get(&month_number).copied().unwrap_or_default();
    Ok(ChitMonthResponse::new(month, total))
}
