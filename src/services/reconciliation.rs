//! Month-wise due/payment reconciliation.
//!
//! Every figure here is derived from ledger entries alone; nothing is
//! cached or mutated, so the same entries always give the same answer.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::entities::ledger_entries;
use crate::entities::sea_orm_active_enums::EntryType;

/// Payment state of one member for one chit month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthStatus {
    NotStarted,
    Paid,
    Partial,
    Pending,
    Advance,
}

/// Classify a member-month from its cumulative due and paid amounts.
///
/// A month with nothing due but something paid is a prepayment and
/// classifies as `Advance`. Negative inputs are treated as zero.
pub fn classify(due: Decimal, paid: Decimal) -> MonthStatus {
    let due = due.max(Decimal::ZERO);
    let paid = paid.max(Decimal::ZERO);

    if paid > due {
        MonthStatus::Advance
    } else if due.is_zero() {
        MonthStatus::NotStarted
    } else if paid == due {
        MonthStatus::Paid
    } else if paid.is_zero() {
        MonthStatus::Pending
    } else {
        MonthStatus::Partial
    }
}

/// (member_id, chit_id, month_number); month `None` is the unscheduled bucket
pub type MemberMonthKey = (i32, i32, Option<i32>);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthBalance {
    pub due: Decimal,
    pub paid: Decimal,
    /// Earliest due date among the month's debits
    pub due_date: Option<NaiveDate>,
}

impl MonthBalance {
    pub fn status(&self) -> MonthStatus {
        classify(self.due, self.paid)
    }

    pub fn outstanding(&self) -> Decimal {
        (self.due - self.paid).max(Decimal::ZERO)
    }

    pub fn overpaid(&self) -> Decimal {
        (self.paid - self.due).max(Decimal::ZERO)
    }

    fn apply(&mut self, entry: &ledger_entries::Model) {
        match entry.entry_type {
            EntryType::Debit => {
                self.due += entry.amount;
                self.due_date = match (self.due_date, entry.due_date) {
                    (Some(a), Some(b)) => Some(a.min(b)),
                    (a, b) => a.or(b),
                };
            }
            EntryType::Credit if entry.source.settles_dues() => self.paid += entry.amount,
            // Auction payout/commission credits are disbursements, not dues paid
            EntryType::Credit => {}
        }
    }
}

/// Sum debits and settling credits per member-month
pub fn member_month_balances<'a, I>(entries: I) -> BTreeMap<MemberMonthKey, MonthBalance>
where
    I: IntoIterator<Item = &'a ledger_entries::Model>,
{
    let mut balances: BTreeMap<MemberMonthKey, MonthBalance> = BTreeMap::new();
    for entry in entries {
        balances
            .entry((entry.member_id, entry.chit_id, entry.month_number))
            .or_default()
            .apply(entry);
    }
    balances
}

/// One row of a member's month-wise tally for a chit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthTally {
    pub month_number: i32,
    pub due: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
    pub status: MonthStatus,
    pub due_date: Option<NaiveDate>,
}

/// Month 1..=total_months tally of one member in one chit. Months without
/// entries come out as `not_started`.
pub fn month_tally(
    entries: &[ledger_entries::Model],
    member_id: i32,
    chit_id: i32,
    total_months: i32,
) -> Vec<MonthTally> {
    let balances = member_month_balances(
        entries
            .iter()
            .filter(|e| e.member_id == member_id && e.chit_id == chit_id),
    );

    (1..=total_months)
        .map(|month_number| {
            let balance = balances
                .get(&(member_id, chit_id, Some(month_number)))
                .cloned()
                .unwrap_or_default();
            MonthTally {
                month_number,
                due: balance.due,
                paid: balance.paid,
                pending: balance.outstanding(),
                status: balance.status(),
                due_date: balance.due_date,
            }
        })
        .collect()
}
