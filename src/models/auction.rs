//! Auction and bid request/response models

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::sea_orm_active_enums::{AuctionStatus, BidStatus};
use crate::entities::{auctions, bids};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleAuctionRequest {
    pub chit_month_id: i32,
    pub auction_date: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaceBidRequest {
    pub auction_id: i32,
    #[serde(alias = "user_id")]
    pub member_id: i32,
    pub bid_amount: Decimal,
    pub notes: Option<String>,
}

impl PlaceBidRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.bid_amount <= Decimal::ZERO {
            return Err("bid_amount must be greater than zero".to_string());
        }
        if self.bid_amount.scale() > 2 {
            return Err("bid_amount cannot have more than 2 decimal places".to_string());
        }
        if let Some(notes) = &self.notes {
            if notes.chars().count() > 500 {
                return Err("notes cannot exceed 500 characters".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuctionListQuery {
    pub chit_id: Option<i32>,
    pub status: Option<AuctionStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidResponse {
    pub id: i32,
    pub member_id: i32,
    pub member_name: String,
    pub bid_amount: Decimal,
    pub bid_time: DateTime<FixedOffset>,
    pub status: BidStatus,
    pub notes: Option<String>,
}

impl BidResponse {
    pub fn new(bid: bids::Model, member_name: String) -> Self {
        Self {
            id: bid.id,
            member_id: bid.member_id,
            member_name,
            bid_amount: bid.bid_amount,
            bid_time: bid.bid_time,
            status: bid.status,
            notes: bid.notes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionResponse {
    pub id: i32,
    pub chit_id: i32,
    pub chit_name: String,
    pub chit_month_id: i32,
    pub month_number: i32,
    pub auction_date: DateTime<FixedOffset>,
    pub status: AuctionStatus,
    pub total_bids: u64,
    pub winning_bid_amount: Option<Decimal>,
    pub winner_member_id: Option<i32>,
    pub dividend_per_member: Option<Decimal>,
}

impl AuctionResponse {
    pub fn new(
        auction: auctions::Model,
        chit_id: i32,
        chit_name: String,
        month_number: i32,
        total_bids: u64,
    ) -> Self {
        Self {
            id: auction.id,
            chit_id,
            chit_name,
            chit_month_id: auction.chit_month_id,
            month_number,
            auction_date: auction.auction_date,
            status: auction.status,
            total_bids,
            winning_bid_amount: auction.winning_bid_amount,
            winner_member_id: auction.winner_member_id,
            dividend_per_member: auction.dividend_per_member,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuctionDetailResponse {
    #[serde(flatten)]
    pub auction: AuctionResponse,
    pub total_amount: Decimal,
    pub member_count: u64,
    /// Sorted by amount, then bid time
    pub bids: Vec<BidResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloseAuctionResponse {
    pub auction_id: i32,
    pub chit_month_id: i32,
    pub winning_bid_id: i32,
    pub winner_member_id: i32,
    pub winning_bid_amount: Decimal,
    pub payout_amount: Decimal,
    pub admin_profit: Decimal,
    pub dividend_per_member: Option<Decimal>,
    /// Ledger rows appended by the close (payout, commission)
    pub ledger_entry_ids: Vec<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bid_must_be_positive() {
        let mut req = PlaceBidRequest {
            auction_id: 1,
            member_id: 1,
            bid_amount: dec!(0),
            notes: None,
        };
        assert!(req.validate().is_err());
        req.bid_amount = dec!(-10);
        assert!(req.validate().is_err());
        req.bid_amount = dec!(85000);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_bid_limited_to_two_decimals() {
        let mut req = PlaceBidRequest {
            auction_id: 1,
            member_id: 1,
            bid_amount: dec!(8500.005),
            notes: None,
        };
        assert!(req.validate().is_err());
        req.bid_amount = dec!(8500.05);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_status_query_parses_snake_case() {
        let query: AuctionListQuery =
            serde_json::from_str(r#"{"chit_id": 2, "status": "open"}"#).unwrap();
        assert_eq!(query.status, Some(AuctionStatus::Open));
    }
}
