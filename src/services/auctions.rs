//! Monthly reverse auctions backed by the database.
//!
//! Every transition is a conditional update on the current status, so two
//! concurrent `close` calls cannot both succeed: the loser sees zero rows
//! affected and fails with `InvalidState`.

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::{info, warn};

use crate::entities::prelude::*;
use crate::entities::sea_orm_active_enums::{AuctionStatus, BidStatus, ChitMonthStatus};
use crate::entities::{auctions, bids, chit_months, chits};
use crate::error::{ApiError, ApiResult};
use crate::models::auction::{
    AuctionDetailResponse, AuctionResponse, BidResponse, CloseAuctionResponse, PlaceBidRequest,
    ScheduleAuctionRequest,
};
use crate::services::auction_rules::{self, AuctionAction};
use crate::services::chits::{
    complete_month, find_chit, find_membership, member_count, member_names, MonthOutcome,
};
use crate::services::members::find_member;

pub async fn schedule_auction(
    db: &DatabaseConnection,
    req: ScheduleAuctionRequest,
) -> ApiResult<AuctionResponse> {
    let txn = db.begin().await?;

    let month = ChitMonths::find_by_id(req.chit_month_id)
        .one(&txn)
        .await?
        .ok_or_else(|| {
            ApiError::validation(format!("chit month {} does not exist", req.chit_month_id))
        })?;
    if month.status != ChitMonthStatus::Pending {
        return Err(ApiError::validation(format!(
            "month {} of chit {} is already completed",
            month.month_number, month.chit_id
        )));
    }

    let existing = Auctions::find()
        .filter(auctions::Column::ChitMonthId.eq(month.id))
        .one(&txn)
        .await?;
    if let Some(existing) = existing {
        return Err(ApiError::validation(format!(
            "auction {} already exists for month {} of chit {}",
            existing.id, month.month_number, month.chit_id
        )));
    }

    let chit = find_chit(&txn, month.chit_id).await?;
    let now = Utc::now().fixed_offset();
    let auction = auctions::ActiveModel {
        chit_month_id: Set(month.id),
        auction_date: Set(req.auction_date),
        status: Set(AuctionStatus::Scheduled),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        auction_id = auction.id,
        chit_id = chit.id,
        month_number = month.month_number,
        "Auction scheduled"
    );
    Ok(AuctionResponse::new(auction, chit.id, chit.name, month.month_number, 0))
}

pub async fn open_auction(db: &DatabaseConnection, auction_id: i32) -> ApiResult<AuctionDetailResponse> {
    let auction = find_auction(db, auction_id).await?;
    let next = auction_rules::transition(auction.status, AuctionAction::Open)?;

    let result = Auctions::update_many()
        .set(auctions::ActiveModel {
            status: Set(next),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        })
        .filter(auctions::Column::Id.eq(auction_id))
        .filter(auctions::Column::Status.eq(AuctionStatus::Scheduled))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(stale_status(auction_id));
    }

    info!(auction_id, "Auction opened");
    get_auction(db, auction_id).await
}

/// Append a bid to an open auction. Bids are independent records; a member
/// may bid more than once.
pub async fn place_bid(db: &DatabaseConnection, req: PlaceBidRequest) -> ApiResult<BidResponse> {
    req.validate().map_err(ApiError::Validation)?;

    let txn = db.begin().await?;

    let auction = find_auction(&txn, req.auction_id).await?;
    auction_rules::transition(auction.status, AuctionAction::Bid)?;

    let month = find_auction_month(&txn, &auction).await?;
    let chit = find_chit(&txn, month.chit_id).await?;
    if req.bid_amount >= chit.total_amount {
        return Err(ApiError::validation(format!(
            "bid_amount must be less than the chit total of {}",
            chit.total_amount
        )));
    }

    let member = find_member(&txn, req.member_id).await?;
    if !member.is_active || find_membership(&txn, chit.id, member.id).await?.is_none() {
        return Err(ApiError::validation(format!(
            "member {} is not a current member of chit {}",
            member.id, chit.id
        )));
    }

    let prior_win = ChitMonths::find()
        .filter(chit_months::Column::ChitId.eq(chit.id))
        .filter(chit_months::Column::WinnerMemberId.eq(member.id))
        .one(&txn)
        .await?;
    if let Some(won) = prior_win {
        return Err(ApiError::validation(format!(
            "member {} already won month {} of chit {}",
            member.id, won.month_number, chit.id
        )));
    }

    // Holds the auction row until commit; a close that got there first
    // leaves nothing to match.
    lock_open(&txn, auction.id).await?;

    let bid = bids::ActiveModel {
        auction_id: Set(auction.id),
        member_id: Set(member.id),
        bid_amount: Set(req.bid_amount),
        bid_time: Set(Utc::now().fixed_offset()),
        status: Set(BidStatus::Active),
        notes: Set(req.notes.filter(|n| !n.trim().is_empty())),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    info!(
        auction_id = auction.id,
        bid_id = bid.id,
        member_id = member.id,
        amount = %bid.bid_amount,
        "Bid placed"
    );
    Ok(BidResponse::new(bid, member.name))
}

/// Close an open auction: pick the lowest bid, settle every bid, complete
/// the month and append the payout and commission credits, all in one
/// transaction.
pub async fn close_auction(
    db: &DatabaseConnection,
    commission_rate: Decimal,
    auction_id: i32,
) -> ApiResult<CloseAuctionResponse> {
    let txn = db.begin().await?;

    let auction = find_auction(&txn, auction_id).await?;
    let next = auction_rules::transition(auction.status, AuctionAction::Close)?;

    // Bids are read only after the row is held, so none can land between
    // the read and the settlement.
    lock_open(&txn, auction_id).await?;

    let month = find_auction_month(&txn, &auction).await?;
    let chit = find_chit(&txn, month.chit_id).await?;
    let members = member_count(&txn, chit.id).await?;
    let bids = Bids::find()
        .filter(bids::Column::AuctionId.eq(auction_id))
        .all(&txn)
        .await?;

    let settlement = match auction_rules::settle(
        auction_id,
        &bids,
        chit.total_amount,
        members,
        commission_rate,
    ) {
        Ok(settlement) => settlement,
        Err(e) => {
            warn!(auction_id, "Close rejected: no bids");
            return Err(e);
        }
    };

    let closed = Auctions::update_many()
        .set(auctions::ActiveModel {
            status: Set(next),
            winning_bid_amount: Set(Some(settlement.winning_bid_amount)),
            winner_member_id: Set(Some(settlement.winner_member_id)),
            dividend_per_member: Set(settlement.dividend_per_member),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        })
        .filter(auctions::Column::Id.eq(auction_id))
        .filter(auctions::Column::Status.eq(AuctionStatus::Open))
        .exec(&txn)
        .await?;
    if closed.rows_affected == 0 {
        return Err(stale_status(auction_id));
    }

    Bids::update_many()
        .set(bids::ActiveModel {
            status: Set(BidStatus::Accepted),
            ..Default::default()
        })
        .filter(bids::Column::Id.eq(settlement.winning_bid_id))
        .exec(&txn)
        .await?;
    Bids::update_many()
        .set(bids::ActiveModel {
            status: Set(BidStatus::Rejected),
            ..Default::default()
        })
        .filter(bids::Column::AuctionId.eq(auction_id))
        .filter(bids::Column::Id.ne(settlement.winning_bid_id))
        .exec(&txn)
        .await?;

    let outcome = MonthOutcome {
        winner_member_id: settlement.winner_member_id,
        auction_date: auction.auction_date.date_naive(),
        payout_amount: settlement.payout_amount,
        admin_profit: settlement.admin_profit,
        reference_id: auction_id,
        reference_type: "auction",
    };
    let (month, ledger_entry_ids) = complete_month(&txn, &chit, &month, &outcome).await?;

    txn.commit().await?;

    info!(
        auction_id,
        chit_id = chit.id,
        month_number = month.month_number,
        winner = settlement.winner_member_id,
        winning_bid = %settlement.winning_bid_amount,
        admin_profit = %settlement.admin_profit,
        "Auction closed"
    );

    Ok(CloseAuctionResponse {
        auction_id,
        chit_month_id: month.id,
        winning_bid_id: settlement.winning_bid_id,
        winner_member_id: settlement.winner_member_id,
        winning_bid_amount: settlement.winning_bid_amount,
        payout_amount: settlement.payout_amount,
        admin_profit: settlement.admin_profit,
        dividend_per_member: settlement.dividend_per_member,
        ledger_entry_ids,
    })
}

/// Cancel a scheduled or open auction. Outstanding bids are rejected and
/// the month stays pending.
pub async fn cancel_auction(
    db: &DatabaseConnection,
    auction_id: i32,
) -> ApiResult<AuctionDetailResponse> {
    let txn = db.begin().await?;

    let auction = find_auction(&txn, auction_id).await?;
    let next = auction_rules::transition(auction.status, AuctionAction::Cancel)?;

    let result = Auctions::update_many()
        .set(auctions::ActiveModel {
            status: Set(next),
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        })
        .filter(auctions::Column::Id.eq(auction_id))
        .filter(auctions::Column::Status.is_in([AuctionStatus::Scheduled, AuctionStatus::Open]))
        .exec(&txn)
        .await?;
    if result.rows_affected == 0 {
        return Err(stale_status(auction_id));
    }

    Bids::update_many()
        .set(bids::ActiveModel {
            status: Set(BidStatus::Rejected),
            ..Default::default()
        })
        .filter(bids::Column::AuctionId.eq(auction_id))
        .filter(bids::Column::Status.eq(BidStatus::Active))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    info!(auction_id, "Auction cancelled");
    get_auction(db, auction_id).await
}

pub async fn list_auctions(
    db: &DatabaseConnection,
    chit_id: Option<i32>,
    status: Option<AuctionStatus>,
) -> ApiResult<Vec<AuctionResponse>> {
    let mut query = Auctions::find();
    if let Some(status) = status {
        query = query.filter(auctions::Column::Status.eq(status));
    }
    let auctions = query
        .order_by_desc(auctions::Column::AuctionDate)
        .order_by_desc(auctions::Column::Id)
        .all(db)
        .await?;

    let months: HashMap<i32, chit_months::Model> = ChitMonths::find()
        .filter(chit_months::Column::Id.is_in(auctions.iter().map(|a| a.chit_month_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();
    let chits: HashMap<i32, chits::Model> = Chits::find()
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let mut bid_counts: HashMap<i32, u64> = HashMap::new();
    for bid in Bids::find()
        .filter(bids::Column::AuctionId.is_in(auctions.iter().map(|a| a.id)))
        .all(db)
        .await?
    {
        *bid_counts.entry(bid.auction_id).or_default() += 1;
    }

    let mut responses = Vec::with_capacity(auctions.len());
    for auction in auctions {
        let Some(month) = months.get(&auction.chit_month_id) else {
            continue;
        };
        if chit_id.is_some_and(|id| id != month.chit_id) {
            continue;
        }
        let chit_name = chits
            .get(&month.chit_id)
            .map(|c| c.name.clone())
            .unwrap_or_default();
        let total_bids = bid_counts.get(&auction.id).copied().unwrap_or(0);
        responses.push(AuctionResponse::new(
            auction,
            month.chit_id,
            chit_name,
            month.month_number,
            total_bids,
        ));
    }
    Ok(responses)
}

pub async fn get_auction(db: &DatabaseConnection, auction_id: i32) -> ApiResult<AuctionDetailResponse> {
    let auction = find_auction(db, auction_id).await?;
    let month = find_auction_month(db, &auction).await?;
    let chit = find_chit(db, month.chit_id).await?;
    let members = member_count(db, chit.id).await?;

    let bids = Bids::find()
        .filter(bids::Column::AuctionId.eq(auction_id))
        .order_by_asc(bids::Column::BidAmount)
        .order_by_asc(bids::Column::BidTime)
        .order_by_asc(bids::Column::Id)
        .all(db)
        .await?;
    let names = member_names(db, bids.iter().map(|b| b.member_id)).await?;
    let total_bids = bids.len() as u64;
    let bids = bids
        .into_iter()
        .map(|bid| {
            let name = names
                .get(&bid.member_id)
                .map(|(name, _)| name.clone())
                .unwrap_or_default();
            BidResponse::new(bid, name)
        })
        .collect();

    Ok(AuctionDetailResponse {
        auction: AuctionResponse::new(auction, chit.id, chit.name, month.month_number, total_bids),
        total_amount: chit.total_amount,
        member_count: members,
        bids,
    })
}

async fn find_auction<C: ConnectionTrait>(db: &C, auction_id: i32) -> ApiResult<auctions::Model> {
    Auctions::find_by_id(auction_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("auction {} not found", auction_id)))
}

async fn find_auction_month<C: ConnectionTrait>(
    db: &C,
    auction: &auctions::Model,
) -> ApiResult<chit_months::Model> {
    ChitMonths::find_by_id(auction.chit_month_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("chit month {} not found", auction.chit_month_id)))
}

/// Touch an open auction inside `txn`, taking its row lock until commit.
/// Fails with `InvalidState` once the auction has left `open`.
async fn lock_open<C: ConnectionTrait>(txn: &C, auction_id: i32) -> ApiResult<()> {
    let touched = Auctions::update_many()
        .set(auctions::ActiveModel {
            updated_at: Set(Utc::now().fixed_offset()),
            ..Default::default()
        })
        .filter(auctions::Column::Id.eq(auction_id))
        .filter(auctions::Column::Status.eq(AuctionStatus::Open))
        .exec(txn)
        .await?;
    if touched.rows_affected == 0 {
        return Err(stale_status(auction_id));
    }
    Ok(())
}

/// Another request changed the auction between our read and our write
fn stale_status(auction_id: i32) -> ApiError {
    ApiError::invalid_state(format!(
        "auction {} changed status concurrently; refresh and retry",
        auction_id
    ))
}
