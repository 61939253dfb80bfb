//! FIFO allocation of a payment across a member's outstanding months.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationKind {
    Full,
    Partial,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthAllocation {
    pub month_number: i32,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: AllocationKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentAllocation {
    pub allocations: Vec<MonthAllocation>,
    /// Remainder after every outstanding month is cleared
    pub advance_amount: Decimal,
}

/// Allocate `amount` to the oldest outstanding months first.
///
/// `outstanding` is (month_number, pending) and may be in any order;
/// months with nothing pending are skipped.
pub fn allocate_fifo(outstanding: &[(i32, Decimal)], amount: Decimal) -> PaymentAllocation {
    let mut months: Vec<(i32, Decimal)> = outstanding
        .iter()
        .copied()
        .filter(|(_, pending)| *pending > Decimal::ZERO)
        .collect();
    months.sort_by_key(|(month_number, _)| *month_number);

    let mut remaining = amount.max(Decimal::ZERO);
    let mut allocations = Vec::new();

    for (month_number, pending) in months {
        if remaining <= Decimal::ZERO {
            break;
        }
        let (applied, kind) = if remaining >= pending {
            (pending, AllocationKind::Full)
        } else {
            (remaining, AllocationKind::Partial)
        };
        allocations.push(MonthAllocation {
            month_number,
            amount: applied,
            kind,
        });
        remaining -= applied;
    }

    PaymentAllocation {
        allocations,
        advance_amount: remaining,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_oldest_month_first() {
        let result = allocate_fifo(&[(3, dec!(5000)), (1, dec!(1500)), (2, dec!(5000))], dec!(4000));
        assert_eq!(
            result.allocations,
            vec![
                MonthAllocation { month_number: 1, amount: dec!(1500), kind: AllocationKind::Full },
                MonthAllocation { month_number: 2, amount: dec!(2500), kind: AllocationKind::Partial },
            ]
        );
        assert_eq!(result.advance_amount, Decimal::ZERO);
    }

    #[test]
    fn test_excess_becomes_advance() {
        let result = allocate_fifo(&[(1, dec!(5000))], dec!(7000));
        assert_eq!(result.allocations.len(), 1);
        assert_eq!(result.allocations[0].kind, AllocationKind::Full);
        assert_eq!(result.advance_amount, dec!(2000));
    }

    #[test]
    fn test_nothing_outstanding() {
        let result = allocate_fifo(&[(1, Decimal::ZERO)], dec!(500));
        assert!(result.allocations.is_empty());
        assert_eq!(result.advance_amount, dec!(500));
    }

    #[test]
    fn test_allocated_plus_advance_equals_payment() {
        let outstanding = [(1, dec!(1200.50)), (2, dec!(5000)), (4, dec!(10))];
        for amount in [dec!(1), dec!(1200.50), dec!(3000), dec!(6210.50), dec!(9999)] {
            let result = allocate_fifo(&outstanding, amount);
            let allocated: Decimal = result.allocations.iter().map(|a| a.amount).sum();
            assert_eq!(allocated + result.advance_amount, amount);
        }
    }
}
