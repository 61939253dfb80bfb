use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::error::ApiError;
use crate::models::report::ProfitQuery;
use crate::services::aggregation::{ChitProfitReport, ProfitSummary};
use crate::services::reports;
use crate::AppState;

/// GET /reports/profit?active=true&year=2026
pub async fn get_profit_summary(
    State(state): State<AppState>,
    Query(query): Query<ProfitQuery>,
) -> Result<Json<ProfitSummary>, ApiError> {
    Ok(Json(reports::profit_summary(&state.db, &query).await?))
}

/// GET /reports/profit/chits/{id}
pub async fn get_chit_profit(
    State(state): State<AppState>,
    Path(chit_id): Path<i32>,
) -> Result<Json<ChitProfitReport>, ApiError> {
    Ok(Json(reports::chit_profit(&state.db, chit_id).await?))
}
