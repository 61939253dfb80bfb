//! Auction handlers
//!
//! /auctions endpoints driving the reverse auction for a chit month.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::error::ApiError;
use crate::models::auction::{
    AuctionDetailResponse, AuctionListQuery, AuctionResponse, BidResponse, CloseAuctionResponse,
    PlaceBidRequest, ScheduleAuctionRequest,
};
use crate::services::auctions;
use crate::AppState;

/// GET /auctions?chit_id=1&status=open
pub async fn list_auctions(
    State(state): State<AppState>,
    Query(query): Query<AuctionListQuery>,
) -> Result<Json<Vec<AuctionResponse>>, ApiError> {
    let rows = auctions::list_auctions(&state.db, query.chit_id, query.status).await?;
    info!(count = rows.len(), chit_id = ?query.chit_id, "Auctions returned");
    Ok(Json(rows))
}

/// POST /auctions
pub async fn schedule_auction(
    State(state): State<AppState>,
    Json(req): Json<ScheduleAuctionRequest>,
) -> Result<(StatusCode, Json<AuctionResponse>), ApiError> {
    let auction = auctions::schedule_auction(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(auction)))
}

/// GET /auctions/{id}
pub async fn get_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i32>,
) -> Result<Json<AuctionDetailResponse>, ApiError> {
    Ok(Json(auctions::get_auction(&state.db, auction_id).await?))
}

/// POST /auctions/{id}/open
pub async fn open_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i32>,
) -> Result<Json<AuctionDetailResponse>, ApiError> {
    Ok(Json(auctions::open_auction(&state.db, auction_id).await?))
}

/// POST /auctions/bid
///
/// # Request
///
/// ```json
/// { "auction_id": 3, "member_id": 4, "bid_amount": "85000", "notes": null }
/// ```
pub async fn place_bid(
    State(state): State<AppState>,
    Json(req): Json<PlaceBidRequest>,
) -> Result<(StatusCode, Json<BidResponse>), ApiError> {
    let bid = auctions::place_bid(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(bid)))
}

/// POST /auctions/{id}/close
///
/// 409 unless the auction is open, 422 when it has no bids.
pub async fn close_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i32>,
) -> Result<Json<CloseAuctionResponse>, ApiError> {
    info!(auction_id, "Close auction request received");
    let result =
        auctions::close_auction(&state.db, state.config.commission_rate, auction_id).await?;
    Ok(Json(result))
}

/// POST /auctions/{id}/cancel
pub async fn cancel_auction(
    State(state): State<AppState>,
    Path(auction_id): Path<i32>,
) -> Result<Json<AuctionDetailResponse>, ApiError> {
    Ok(Json(auctions::cancel_auction(&state.db, auction_id).await?))
}
