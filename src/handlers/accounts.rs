//! Account handlers
//!
//! /accounts endpoints over the ledger: dues, payments, adjustments and
//! the views derived from them.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::entities::ledger_entries;
use crate::error::ApiError;
use crate::models::account::{
    AdjustmentRequest, DashboardResponse, DefaulterEntry, DefaulterQuery, GenerateDuesResponse,
    LedgerListQuery, MemberAccountResponse, PaymentListQuery, PaymentPreviewQuery,
    PaymentPreviewResponse, PaymentRecord, PaymentRequest, PaymentResponse,
};
use crate::services::aggregation::{DefaulterStats, Page};
use crate::services::ledger;
use crate::AppState;

/// GET /accounts/ledger
///
/// # Query Parameters
///
/// - `page` - 1-based page (default: 1)
/// - `per_page` - Page size (default: configured, max: 100)
/// - `entry_type`, `source`, `month_number`, `year`, `chit_id`, `member_id` - ANDed filters
pub async fn get_ledger(
    State(state): State<AppState>,
    Query(query): Query<LedgerListQuery>,
) -> Result<Json<Page<ledger_entries::Model>>, ApiError> {
    let page = ledger::ledger_page(&state.db, &query, state.config.default_per_page).await?;
    info!(
        total = page.total,
        page = page.page,
        per_page = page.per_page,
        "Ledger page returned"
    );
    Ok(Json(page))
}

/// POST /accounts/ledger/adjustment
pub async fn create_adjustment(
    State(state): State<AppState>,
    Json(req): Json<AdjustmentRequest>,
) -> Result<(StatusCode, Json<ledger_entries::Model>), ApiError> {
    let entry = ledger::create_adjustment(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// GET /accounts/dashboard
pub async fn get_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, ApiError> {
    let today = Utc::now().date_naive();
    Ok(Json(ledger::dashboard(&state.db, today).await?))
}

/// POST /accounts/dues/{chit_id}/{month_number}
pub async fn generate_dues(
    State(state): State<AppState>,
    Path((chit_id, month_number)): Path<(i32, i32)>,
) -> Result<(StatusCode, Json<GenerateDuesResponse>), ApiError> {
    let result = ledger::generate_dues(&state.db, chit_id, month_number).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

/// POST /accounts/payments
///
/// # Request
///
/// ```json
/// { "member_id": 4, "chit_id": 1, "amount": "7500", "mode": "cash", "notes": null }
/// ```
pub async fn record_payment(
    State(state): State<AppState>,
    Json(req): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError> {
    let payment = ledger::record_payment(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /accounts/payments
///
/// # Query Parameters
///
/// - `member_id` (alias `user_id`), `chit_id` - ANDed filters
/// - `month_number` - payments with a share booked against that month
/// - `page`, `per_page` - as for the ledger
pub async fn list_payments(
    State(state): State<AppState>,
    Query(query): Query<PaymentListQuery>,
) -> Result<Json<Page<PaymentRecord>>, ApiError> {
    let page = ledger::list_payments(&state.db, &query, state.config.default_per_page).await?;
    info!(total = page.total, page = page.page, "Payments returned");
    Ok(Json(page))
}

/// GET /accounts/payments/{id}
pub async fn get_payment(
    State(state): State<AppState>,
    Path(payment_id): Path<i32>,
) -> Result<Json<PaymentRecord>, ApiError> {
    Ok(Json(ledger::get_payment(&state.db, payment_id).await?))
}

/// GET /accounts/payment-preview?member_id=4&chit_id=1&amount=7500
pub async fn preview_payment(
    State(state): State<AppState>,
    Query(query): Query<PaymentPreviewQuery>,
) -> Result<Json<PaymentPreviewResponse>, ApiError> {
    Ok(Json(ledger::preview_payment(&state.db, query).await?))
}

/// GET /accounts/members/{id}
pub async fn get_member_account(
    State(state): State<AppState>,
    Path(member_id): Path<i32>,
) -> Result<Json<MemberAccountResponse>, ApiError> {
    Ok(Json(ledger::member_account(&state.db, member_id).await?))
}

/// GET /accounts/defaulters?chit_id=1
pub async fn get_defaulters(
    State(state): State<AppState>,
    Query(query): Query<DefaulterQuery>,
) -> Result<Json<Vec<DefaulterEntry>>, ApiError> {
    let rows = ledger::defaulters(&state.db, query.chit_id).await?;
    info!(count = rows.len(), chit_id = ?query.chit_id, "Defaulters returned");
    Ok(Json(rows))
}

/// GET /accounts/defaulters/stats?chit_id=1
pub async fn get_defaulter_stats(
    State(state): State<AppState>,
    Query(query): Query<DefaulterQuery>,
) -> Result<Json<DefaulterStats>, ApiError> {
    Ok(Json(ledger::defaulter_stats(&state.db, query.chit_id).await?))
}
