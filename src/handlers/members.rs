//! Member handlers
//!
//! /members endpoints for registering, listing and deactivating members.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::error::ApiError;
use crate::models::member::{CreateMemberRequest, MemberListQuery, MemberResponse};
use crate::services::members;
use crate::AppState;

/// POST /members
pub async fn create_member(
    State(state): State<AppState>,
    Json(req): Json<CreateMemberRequest>,
) -> Result<(StatusCode, Json<MemberResponse>), ApiError> {
    info!(name = %req.name, "Create member request received");
    let member = members::create_member(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(member.into())))
}

/// GET /members?active=true
pub async fn list_members(
    State(state): State<AppState>,
    Query(query): Query<MemberListQuery>,
) -> Result<Json<Vec<MemberResponse>>, ApiError> {
    let rows = members::list_members(&state.db, query.active).await?;
    info!(count = rows.len(), active = ?query.active, "Members returned");
    Ok(Json(rows.into_iter().map(MemberResponse::from).collect()))
}

/// GET /members/{id}
pub async fn get_member(
    State(state): State<AppState>,
    Path(member_id): Path<i32>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = members::find_member(&state.db, member_id).await?;
    Ok(Json(member.into()))
}

/// POST /members/{id}/deactivate
pub async fn deactivate_member(
    State(state): State<AppState>,
    Path(member_id): Path<i32>,
) -> Result<Json<MemberResponse>, ApiError> {
    let member = members::deactivate_member(&state.db, member_id).await?;
    Ok(Json(member.into()))
}
