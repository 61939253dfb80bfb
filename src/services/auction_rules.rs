//! Reverse-auction lifecycle rules.
//!
//! `scheduled -> open -> closed`, or `scheduled | open -> cancelled`.
//! `closed` and `cancelled` are terminal. The lowest bid wins the month's
//! payout; equal amounts go to the earliest bid.

use rust_decimal::Decimal;

use crate::entities::bids;
use crate::entities::sea_orm_active_enums::AuctionStatus;
use crate::error::{ApiError, ApiResult};
use crate::services::chit_math;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuctionAction {
    Open,
    Bid,
    Close,
    Cancel,
}

impl AuctionAction {
    fn describe(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Bid => "accept bids on",
            Self::Close => "close",
            Self::Cancel => "cancel",
        }
    }
}

/// Status after applying `action`, or `InvalidState` when the action is
/// not legal from `current`.
pub fn transition(current: AuctionStatus, action: AuctionAction) -> ApiResult<AuctionStatus> {
    use AuctionStatus::*;

    let next = match (current, action) {
        (Scheduled, AuctionAction::Open) => Open,
        (Open, AuctionAction::Bid) => Open,
        (Open, AuctionAction::Close) => Closed,
        (Scheduled | Open, AuctionAction::Cancel) => Cancelled,
        _ => {
            return Err(ApiError::invalid_state(format!(
                "cannot {} an auction that is {}",
                action.describe(),
                status_label(current)
            )));
        }
    };
    Ok(next)
}

pub fn status_label(status: AuctionStatus) -> &'static str {
    match status {
        AuctionStatus::Scheduled => "scheduled",
        AuctionStatus::Open => "open",
        AuctionStatus::Closed => "closed",
        AuctionStatus::Cancelled => "cancelled",
    }
}

/// Minimum bid_amount, ties broken by earliest bid_time then lowest id
pub fn select_winner(bids: &[bids::Model]) -> Option<&bids::Model> {
    bids.iter()
        .min_by(|a, b| {
            a.bid_amount
                .cmp(&b.bid_amount)
                .then(a.bid_time.cmp(&b.bid_time))
                .then(a.id.cmp(&b.id))
        })
}

/// Amounts fixed at close time and recorded on the chit month
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    pub winning_bid_id: i32,
    pub winner_member_id: i32,
    pub winning_bid_amount: Decimal,
    pub payout_amount: Decimal,
    pub admin_profit: Decimal,
    pub dividend_per_member: Option<Decimal>,
}

/// Determine the winner and the amounts to book. Fails with
/// `EmptyAuction` when there is nothing to choose from.
pub fn settle(
    auction_id: i32,
    bids: &[bids::Model],
    total_amount: Decimal,
    member_count: u64,
    commission_rate: Decimal,
) -> ApiResult<Settlement> {
    let winner = select_winner(bids).ok_or(ApiError::EmptyAuction(auction_id))?;

    Ok(Settlement {
        winning_bid_id: winner.id,
        winner_member_id: winner.member_id,
        winning_bid_amount: winner.bid_amount,
        payout_amount: winner.bid_amount,
        admin_profit: chit_math::commission(total_amount, commission_rate),
        dividend_per_member: chit_math::dividend_per_member(
            total_amount,
            winner.bid_amount,
            member_count,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums::BidStatus;
    use chrono::{Duration, TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn bid(id: i32, member_id: i32, amount: Decimal, minute: i64) -> bids::Model {
        bids::Model {
            id,
            auction_id: 1,
            member_id,
            bid_amount: amount,
            bid_time: Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap().fixed_offset()
                + Duration::minutes(minute),
            status: BidStatus::Active,
            notes: None,
        }
    }

    #[test]
    fn test_legal_transitions() {
        use AuctionStatus::*;
        assert_eq!(transition(Scheduled, AuctionAction::Open).unwrap(), Open);
        assert_eq!(transition(Open, AuctionAction::Bid).unwrap(), Open);
        assert_eq!(transition(Open, AuctionAction::Close).unwrap(), Closed);
        assert_eq!(transition(Scheduled, AuctionAction::Cancel).unwrap(), Cancelled);
        assert_eq!(transition(Open, AuctionAction::Cancel).unwrap(), Cancelled);
    }

    #[test]
    fn test_illegal_transitions_are_invalid_state() {
        use AuctionStatus::*;
        let illegal = [
            (Open, AuctionAction::Open),
            (Closed, AuctionAction::Open),
            (Cancelled, AuctionAction::Open),
            (Scheduled, AuctionAction::Bid),
            (Closed, AuctionAction::Bid),
            (Scheduled, AuctionAction::Close),
            (Closed, AuctionAction::Close),
            (Cancelled, AuctionAction::Close),
            (Closed, AuctionAction::Cancel),
            (Cancelled, AuctionAction::Cancel),
        ];
        for (status, action) in illegal {
            assert!(
                matches!(transition(status, action), Err(ApiError::InvalidState(_))),
                "{:?} from {:?} should be rejected",
                action,
                status
            );
        }
    }

    #[test]
    fn test_lowest_bid_wins() {
        // A:9000 at t1, B:8500 at t2, C:8600 at t3
        let bids = vec![
            bid(1, 10, dec!(9000), 1),
            bid(2, 11, dec!(8500), 2),
            bid(3, 12, dec!(8600), 3),
        ];
        let winner = select_winner(&bids).unwrap();
        assert_eq!(winner.id, 2);
        assert_eq!(winner.member_id, 11);
    }

    #[test]
    fn test_tie_goes_to_earliest_bid() {
        let bids = vec![
            bid(1, 10, dec!(9000), 1),
            bid(5, 12, dec!(8500), 3),
            bid(4, 11, dec!(8500), 2),
        ];
        assert_eq!(select_winner(&bids).unwrap().member_id, 11);
    }

    #[test]
    fn test_same_member_may_bid_repeatedly() {
        let bids = vec![bid(1, 10, dec!(9000), 1), bid(2, 10, dec!(8000), 2)];
        let winner = select_winner(&bids).unwrap();
        assert_eq!(winner.id, 2);
        assert_eq!(winner.member_id, 10);
    }

    #[test]
    fn test_settle_without_bids_is_empty_auction() {
        let result = settle(4, &[], dec!(100000), 20, dec!(0.05));
        assert!(matches!(result, Err(ApiError::EmptyAuction(4))));
    }

    #[test]
    fn test_settlement_amounts() {
        let bids = vec![bid(1, 10, dec!(90000), 1), bid(2, 11, dec!(85000), 2)];
        let settlement = settle(1, &bids, dec!(100000), 20, dec!(0.05)).unwrap();
        assert_eq!(settlement.winner_member_id, 11);
        assert_eq!(settlement.payout_amount, dec!(85000));
        assert_eq!(settlement.admin_profit, dec!(5000));
        assert_eq!(settlement.dividend_per_member, Some(dec!(750)));
    }
}
