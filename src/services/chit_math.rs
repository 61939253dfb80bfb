//! Money rules for chit groups.
//!
//! Amounts are rounded to 2 decimal places, midpoint away from zero. The
//! same rounding is used for monthly dues, commission and dividends.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Maximum rounding drift allowed per month between
/// `monthly_amount * total_months` and `total_amount`.
pub const ROUNDING_TOLERANCE_PER_MONTH: Decimal = dec!(0.005);

pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// monthly_amount = round(total_amount / total_months)
pub fn monthly_amount(total_amount: Decimal, total_months: i32) -> Result<Decimal, String> {
    if total_amount <= Decimal::ZERO {
        return Err("total_amount must be greater than zero".to_string());
    }
    if total_months < 1 {
        return Err("total_months must be at least 1".to_string());
    }
    Ok(round_money(total_amount / Decimal::from(total_months)))
}

/// True when the rounded monthly amount reproduces the total within tolerance
pub fn within_tolerance(total_amount: Decimal, total_months: i32, monthly: Decimal) -> bool {
    let drift = (monthly * Decimal::from(total_months) - total_amount).abs();
    drift <= ROUNDING_TOLERANCE_PER_MONTH * Decimal::from(total_months)
}

/// Admin commission for one month, used by both the auction close and the
/// manual month-result path.
pub fn commission(total_amount: Decimal, rate: Decimal) -> Decimal {
    round_money(total_amount * rate)
}

/// Discount forfeited by the winner, shared across the group's members
pub fn dividend_per_member(
    total_amount: Decimal,
    winning_bid: Decimal,
    member_count: u64,
) -> Option<Decimal> {
    if member_count == 0 {
        return None;
    }
    let pool = (total_amount - winning_bid).max(Decimal::ZERO);
    Some(round_money(pool / Decimal::from(member_count)))
}
