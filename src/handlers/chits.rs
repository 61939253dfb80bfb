//! Chit group handlers
//!
//! /chits endpoints: groups, their member slots and their months.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::error::ApiError;
use crate::models::chit::{
    AddMembershipRequest, ChitListQuery, ChitMonthListResponse, ChitMonthResponse, ChitResponse,
    CreateChitRequest, MembershipListResponse, MembershipResponse, RecordMonthResultRequest,
};
use crate::services::chits;
use crate::AppState;

/// POST /chits
///
/// Creates the group and its months 1..=total_months, all `pending`.
pub async fn create_chit(
    State(state): State<AppState>,
    Json(req): Json<CreateChitRequest>,
) -> Result<(StatusCode, Json<ChitResponse>), ApiError> {
    info!(
        name = %req.name,
        total_amount = %req.total_amount,
        total_months = req.total_months,
        "Create chit request received"
    );
    let chit = chits::create_chit(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(chit)))
}

/// GET /chits?active=true
pub async fn list_chits(
    State(state): State<AppState>,
    Query(query): Query<ChitListQuery>,
) -> Result<Json<Vec<ChitResponse>>, ApiError> {
    let rows = chits::list_chits(&state.db, query.active).await?;
    info!(count = rows.len(), "Chits returned");
    Ok(Json(rows))
}

/// GET /chits/{id}
pub async fn get_chit(
    State(state): State<AppState>,
    Path(chit_id): Path<i32>,
) -> Result<Json<ChitResponse>, ApiError> {
    Ok(Json(chits::get_chit(&state.db, chit_id).await?))
}

/// GET /chits/{id}/members
pub async fn list_memberships(
    State(state): State<AppState>,
    Path(chit_id): Path<i32>,
) -> Result<Json<MembershipListResponse>, ApiError> {
    Ok(Json(chits::list_memberships(&state.db, chit_id).await?))
}

/// POST /chits/{id}/members
///
/// # Request
///
/// ```json
/// { "member_id": 4, "slot_number": 7 }
/// ```
///
/// 400 when the slot is taken or outside 1..=total_months.
pub async fn add_membership(
    State(state): State<AppState>,
    Path(chit_id): Path<i32>,
    Json(req): Json<AddMembershipRequest>,
) -> Result<(StatusCode, Json<MembershipResponse>), ApiError> {
    let membership = chits::add_membership(&state.db, chit_id, req).await?;
    Ok((StatusCode::CREATED, Json(membership)))
}

/// DELETE /chits/{id}/members/{member_id}
///
/// Soft removal: the membership is marked inactive and its slot stays
/// reserved.
pub async fn remove_membership(
    State(state): State<AppState>,
    Path((chit_id, member_id)): Path<(i32, i32)>,
) -> Result<Json<MembershipResponse>, ApiError> {
    Ok(Json(chits::remove_membership(&state.db, chit_id, member_id).await?))
}

/// GET /chits/{id}/months
pub async fn list_months(
    State(state): State<AppState>,
    Path(chit_id): Path<i32>,
) -> Result<Json<ChitMonthListResponse>, ApiError> {
    Ok(Json(chits::list_months(&state.db, chit_id).await?))
}

/// PUT /chits/{id}/months/{n}
///
/// Records a month's result without an auction. `admin_profit` falls back
/// to the configured commission.
///
/// # Request
///
/// ```json
/// {
///   "auction_date": "2026-03-10",
///   "winner_member_id": 4,
///   "payout_amount": "85000",
///   "admin_profit": "5000"
/// }
/// ```
pub async fn record_month_result(
    State(state): State<AppState>,
    Path((chit_id, month_number)): Path<(i32, i32)>,
    Json(req): Json<RecordMonthResultRequest>,
) -> Result<Json<ChitMonthResponse>, ApiError> {
    info!(
        chit_id,
        month_number,
        winner = req.winner_member_id,
        "Manual month result received"
    );
    let month = chits::record_month_result(
        &state.db,
        state.config.commission_rate,
        chit_id,
        month_number,
        req,
    )
    .await?;
    Ok(Json(month))
}
