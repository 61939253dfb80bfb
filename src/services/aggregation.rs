//! Read-only rollups over ledger entries and completed months.
//!
//! Nothing here touches the database; callers load the rows and pass them
//! in, so repeated calls over the same rows yield identical output.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, Condition};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::entities::sea_orm_active_enums::{ChitMonthStatus, EntryType, LedgerSource};
use crate::entities::{chit_months, chits, ledger_entries};
use crate::services::reconciliation::{member_month_balances, MonthStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardTotals {
    pub total_due: Decimal,
    pub total_collected: Decimal,
    pub total_pending: Decimal,
    pub total_advance: Decimal,
    /// Members with at least one `pending` month past its due date
    #[serde(rename = "overdue_users")]
    pub overdue_members: u64,
    pub overdue_amount: Decimal,
}

/// Dashboard totals as of `today`.
pub fn dashboard_totals(entries: &[ledger_entries::Model], today: NaiveDate) -> DashboardTotals {
    let mut totals = DashboardTotals::default();

    for entry in entries {
        match entry.entry_type {
            EntryType::Debit => totals.total_due += entry.amount,
            EntryType::Credit if entry.source.is_collection() => {
                totals.total_collected += entry.amount
            }
            EntryType::Credit => {}
        }
    }

    let mut overdue: BTreeSet<i32> = BTreeSet::new();
    for ((member_id, _, _), balance) in member_month_balances(entries) {
        totals.total_pending += balance.outstanding();
        totals.total_advance += balance.overpaid();

        let past_due = balance.due_date.is_some_and(|d| d < today);
        if past_due && balance.status() == MonthStatus::Pending {
            overdue.insert(member_id);
            totals.overdue_amount += balance.outstanding();
        }
    }
    totals.overdue_members = overdue.len() as u64;

    totals
}

/// Conjunctive filter over ledger entries; `None` fields match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFilter {
    pub entry_type: Option<EntryType>,
    pub source: Option<LedgerSource>,
    pub month_number: Option<i32>,
    /// Calendar year (UTC) of `created_at`
    pub year: Option<i32>,
    pub chit_id: Option<i32>,
    pub member_id: Option<i32>,
}

impl LedgerFilter {
    pub fn condition(&self) -> Condition {
        let mut cond = Condition::all();
        if let Some(entry_type) = self.entry_type {
            cond = cond.add(ledger_entries::Column::EntryType.eq(entry_type));
        }
        if let Some(source) = self.source {
            cond = cond.add(ledger_entries::Column::Source.eq(source));
        }
        if let Some(month_number) = self.month_number {
            cond = cond.add(ledger_entries::Column::MonthNumber.eq(month_number));
        }
        if let Some((from, to)) = self.year.and_then(year_bounds) {
            cond = cond
                .add(ledger_entries::Column::CreatedAt.gte(from))
                .add(ledger_entries::Column::CreatedAt.lt(to));
        }
        if let Some(chit_id) = self.chit_id {
            cond = cond.add(ledger_entries::Column::ChitId.eq(chit_id));
        }
        if let Some(member_id) = self.member_id {
            cond = cond.add(ledger_entries::Column::MemberId.eq(member_id));
        }
        cond
    }
}

/// [Jan 1 of `year`, Jan 1 of `year + 1`) in UTC
fn year_bounds(year: i32) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    let start = |y: i32| {
        NaiveDate::from_ymd_opt(y, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().fixed_offset())
    };
    Some((start(year)?, start(year + 1)?))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

pub fn total_pages(total: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

/// Row offset of a 1-based page, `None` when it does not fit a SQL offset
pub fn page_offset(page: u64, per_page: u64) -> Option<u64> {
    let offset = page.checked_sub(1)?.checked_mul(per_page)?;
    (offset <= i64::MAX as u64).then_some(offset)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthProfit {
    pub month_number: i32,
    pub auction_date: Option<NaiveDate>,
    pub winner_member_id: Option<i32>,
    pub payout_amount: Decimal,
    pub admin_profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMonthProfit {
    pub year: i32,
    pub month: u32,
    pub admin_profit: Decimal,
    pub payout_amount: Decimal,
    pub completed_months: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChitProfitReport {
    pub chit_id: i32,
    pub chit_name: String,
    pub total_amount: Decimal,
    pub total_months: i32,
    pub completed_months: u64,
    pub pending_months: u64,
    pub total_payout: Decimal,
    pub total_profit: Decimal,
    pub months: Vec<MonthProfit>,
    pub by_calendar_month: Vec<CalendarMonthProfit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfitSummary {
    pub total_profit: Decimal,
    pub total_payout: Decimal,
    pub completed_months: u64,
    pub pending_months: u64,
    pub chits: Vec<ChitProfitReport>,
    pub by_calendar_month: Vec<CalendarMonthProfit>,
}

fn completed_profits(months: &[chit_months::Model]) -> Vec<MonthProfit> {
    let mut profits: Vec<MonthProfit> = months
        .iter()
        .filter(|m| m.status == ChitMonthStatus::Completed)
        .filter_map(|m| {
            // Fixed at close time; never recomputed here
            Some(MonthProfit {
                month_number: m.month_number,
                auction_date: m.auction_date,
                winner_member_id: m.winner_member_id,
                payout_amount: m.payout_amount?,
                admin_profit: m.admin_profit?,
            })
        })
        .collect();
    profits.sort_by_key(|p| p.month_number);
    profits
}

/// Newest calendar month first; months without an auction date are skipped.
fn roll_up_calendar<'a, I>(profits: I) -> Vec<CalendarMonthProfit>
where
    I: IntoIterator<Item = &'a MonthProfit>,
{
    let mut buckets: BTreeMap<(i32, u32), CalendarMonthProfit> = BTreeMap::new();
    for profit in profits {
        let Some(date) = profit.auction_date else {
            continue;
        };
        let bucket = buckets
            .entry((date.year(), date.month()))
            .or_insert_with(|| CalendarMonthProfit {
                year: date.year(),
                month: date.month(),
                admin_profit: Decimal::ZERO,
                payout_amount: Decimal::ZERO,
                completed_months: 0,
            });
        bucket.admin_profit += profit.admin_profit;
        bucket.payout_amount += profit.payout_amount;
        bucket.completed_months += 1;
    }
    buckets.into_values().rev().collect()
}

/// Per-seat profit of one chit from its months' recorded admin_profit
pub fn profit_by_seat(chit: &chits::Model, months: &[chit_months::Model]) -> ChitProfitReport {
    let own: Vec<chit_months::Model> = months
        .iter()
        .filter(|m| m.chit_id == chit.id)
        .cloned()
        .collect();
    let profits = completed_profits(&own);
    let pending_months = own
        .iter()
        .filter(|m| m.status == ChitMonthStatus::Pending)
        .count() as u64;

    ChitProfitReport {
        chit_id: chit.id,
        chit_name: chit.name.clone(),
        total_amount: chit.total_amount,
        total_months: chit.total_months,
        completed_months: profits.len() as u64,
        pending_months,
        total_payout: profits.iter().map(|p| p.payout_amount).sum(),
        total_profit: profits.iter().map(|p| p.admin_profit).sum(),
        by_calendar_month: roll_up_calendar(&profits),
        months: profits,
    }
}

/// Profit across every chit, plus a calendar-month rollup over all of them
pub fn profit_summary(chits: &[chits::Model], months: &[chit_months::Model]) -> ProfitSummary {
    let reports: Vec<ChitProfitReport> = chits
        .iter()
        .map(|chit| profit_by_seat(chit, months))
        .collect();

    ProfitSummary {
        total_profit: reports.iter().map(|r| r.total_profit).sum(),
        total_payout: reports.iter().map(|r| r.total_payout).sum(),
        completed_months: reports.iter().map(|r| r.completed_months).sum(),
        pending_months: reports.iter().map(|r| r.pending_months).sum(),
        by_calendar_month: roll_up_calendar(reports.iter().flat_map(|r| r.months.iter())),
        chits: reports,
    }
}

/// Outstanding dues of one member in one chit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Arrears {
    pub member_id: i32,
    pub chit_id: i32,
    pub pending_amount: Decimal,
    /// Months with an outstanding balance, oldest first
    pub pending_months: Vec<i32>,
}

/// Member/chit pairs that owe anything on a scheduled month
pub fn arrears(entries: &[ledger_entries::Model]) -> Vec<Arrears> {
    let mut by_pair: BTreeMap<(i32, i32), Arrears> = BTreeMap::new();
    for ((member_id, chit_id, month_number), balance) in member_month_balances(entries) {
        let Some(month_number) = month_number else {
            continue;
        };
        let outstanding = balance.outstanding();
        if outstanding <= Decimal::ZERO {
            continue;
        }
        let row = by_pair.entry((member_id, chit_id)).or_insert_with(|| Arrears {
            member_id,
            chit_id,
            pending_amount: Decimal::ZERO,
            pending_months: Vec::new(),
        });
        row.pending_amount += outstanding;
        row.pending_months.push(month_number);
    }
    by_pair.into_values().collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// `high` above two instalments owed, `medium` above one, `low` otherwise
pub fn severity(pending_amount: Decimal, monthly_amount: Decimal) -> Severity {
    if pending_amount > monthly_amount * Decimal::from(2) {
        Severity::High
    } else if pending_amount > monthly_amount {
        Severity::Medium
    } else {
        Severity::Low
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityBreakdown {
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaulterStats {
    /// Member/chit pairs with anything outstanding
    pub total_defaulters: u64,
    pub total_pending_amount: Decimal,
    pub severity_breakdown: SeverityBreakdown,
}

/// Roll (pending_amount, severity) pairs up into counts and a total
pub fn defaulter_stats<I>(rows: I) -> DefaulterStats
where
    I: IntoIterator<Item = (Decimal, Severity)>,
{
    let mut stats = DefaulterStats::default();
    for (pending_amount, severity) in rows {
        stats.total_defaulters += 1;
        stats.total_pending_amount += pending_amount;
        match severity {
            Severity::High => stats.severity_breakdown.high += 1,
            Severity::Medium => stats.severity_breakdown.medium += 1,
            Severity::Low => stats.severity_breakdown.low += 1,
        }
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::reconciliation::test_support::entry;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_ledger() -> Vec<ledger_entries::Model> {
        let mut due1 = entry(1, 1, 1, Some(1), EntryType::Debit, LedgerSource::MonthlyDue, dec!(5000));
        due1.due_date = Some(date(2026, 1, 5));
        let mut due2 = entry(2, 2, 1, Some(1), EntryType::Debit, LedgerSource::MonthlyDue, dec!(5000));
        due2.due_date = Some(date(2026, 1, 5));
        let mut due3 = entry(3, 3, 1, Some(1), EntryType::Debit, LedgerSource::MonthlyDue, dec!(5000));
        due3.due_date = Some(date(2026, 1, 5));
        vec![
            due1,
            due2,
            due3,
            // member 1 partial, member 2 overpaid, member 3 untouched
            entry(4, 1, 1, Some(1), EntryType::Credit, LedgerSource::Payment, dec!(2000)),
            entry(5, 2, 1, Some(1), EntryType::Credit, LedgerSource::Payment, dec!(5000)),
            entry(6, 2, 1, None, EntryType::Credit, LedgerSource::Advance, dec!(1000)),
            // payout + commission emitted at close are not collections
            entry(7, 2, 1, Some(1), EntryType::Credit, LedgerSource::Auction, dec!(85000)),
            entry(8, 2, 1, Some(1), EntryType::Credit, LedgerSource::Auction, dec!(5000)),
        ]
    }

    #[test]
    fn test_dashboard_totals() {
        let totals = dashboard_totals(&sample_ledger(), date(2026, 2, 1));
        assert_eq!(totals.total_due, dec!(15000));
        assert_eq!(totals.total_collected, dec!(8000));
        assert_eq!(totals.total_pending, dec!(8000));
        assert_eq!(totals.total_advance, dec!(1000));
        // member 3 is pending past due; member 1 is partial
        assert_eq!(totals.overdue_members, 1);
        assert_eq!(totals.overdue_amount, dec!(5000));
    }

    #[test]
    fn test_dashboard_not_overdue_before_due_date() {
        let totals = dashboard_totals(&sample_ledger(), date(2026, 1, 5));
        assert_eq!(totals.overdue_members, 0);
        assert_eq!(totals.overdue_amount, Decimal::ZERO);
    }

    #[test]
    fn test_dashboard_is_idempotent() {
        let ledger = sample_ledger();
        let today = Utc::now().date_naive();
        assert_eq!(dashboard_totals(&ledger, today), dashboard_totals(&ledger, today));
    }

    #[test]
    fn test_empty_ledger() {
        assert_eq!(
            dashboard_totals(&[], date(2026, 1, 1)),
            DashboardTotals::default()
        );
    }

    #[test]
    fn test_year_bounds() {
        let (from, to) = year_bounds(2026).unwrap();
        assert_eq!(from.to_rfc3339(), "2026-01-01T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2027-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 50), 0);
        assert_eq!(total_pages(50, 50), 1);
        assert_eq!(total_pages(51, 50), 2);
    }

    #[test]
    fn test_page_offset_bounds() {
        assert_eq!(page_offset(1, 50), Some(0));
        assert_eq!(page_offset(3, 50), Some(100));
        assert_eq!(page_offset(0, 50), None);
        assert_eq!(page_offset(u64::MAX, 50), None);
        assert_eq!(page_offset(u64::MAX / 50, 50), None);
    }

    #[test]
    fn test_dashboard_totals_wire_name() {
        let json = serde_json::to_value(DashboardTotals::default()).unwrap();
        assert!(json.get("overdue_users").is_some());
        assert!(json.get("overdue_members").is_none());
    }

    fn chit() -> chits::Model {
        chits::Model {
            id: 1,
            name: "Kuri A".to_string(),
            total_amount: dec!(100000),
            total_months: 3,
            monthly_amount: dec!(33333.33),
            start_date: Some(date(2026, 1, 1)),
            is_active: true,
            created_at: Utc::now().fixed_offset(),
        }
    }

    fn month(
        id: i32,
        number: i32,
        status: ChitMonthStatus,
        auction_date: Option<NaiveDate>,
        payout: Option<Decimal>,
        profit: Option<Decimal>,
    ) -> chit_months::Model {
        chit_months::Model {
            id,
            chit_id: 1,
            month_number: number,
            status,
            auction_date,
            winner_member_id: payout.map(|_| number),
            payout_amount: payout,
            admin_profit: profit,
            created_at: Utc::now().fixed_offset(),
        }
    }

    #[test]
    fn test_profit_by_seat_uses_recorded_profit() {
        let months = vec![
            month(1, 1, ChitMonthStatus::Completed, Some(date(2026, 1, 10)), Some(dec!(85000)), Some(dec!(5000))),
            month(2, 2, ChitMonthStatus::Completed, Some(date(2026, 1, 28)), Some(dec!(88000)), Some(dec!(4200))),
            month(3, 3, ChitMonthStatus::Pending, None, None, None),
        ];

        let report = profit_by_seat(&chit(), &months);
        assert_eq!(report.completed_months, 2);
        assert_eq!(report.pending_months, 1);
        assert_eq!(report.total_profit, dec!(9200));
        assert_eq!(report.total_payout, dec!(173000));
        assert_eq!(report.by_calendar_month.len(), 1);
        assert_eq!(report.by_calendar_month[0].admin_profit, dec!(9200));
        assert_eq!(report.by_calendar_month[0].completed_months, 2);
    }

    #[test]
    fn test_profit_summary_calendar_newest_first() {
        let months = vec![
            month(1, 1, ChitMonthStatus::Completed, Some(date(2026, 1, 10)), Some(dec!(85000)), Some(dec!(5000))),
            month(2, 2, ChitMonthStatus::Completed, Some(date(2026, 3, 10)), Some(dec!(88000)), Some(dec!(5000))),
        ];
        let summary = profit_summary(&[chit()], &months);
        assert_eq!(summary.total_profit, dec!(10000));
        assert_eq!(summary.pending_months, 0);
        let keys: Vec<(i32, u32)> = summary
            .by_calendar_month
            .iter()
            .map(|c| (c.year, c.month))
            .collect();
        assert_eq!(keys, vec![(2026, 3), (2026, 1)]);
    }

    #[test]
    fn test_arrears_groups_by_member_and_chit() {
        let rows = arrears(&sample_ledger());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].member_id, 1);
        assert_eq!(rows[0].pending_amount, dec!(3000));
        assert_eq!(rows[0].pending_months, vec![1]);
        assert_eq!(rows[1].member_id, 3);
        assert_eq!(rows[1].pending_amount, dec!(5000));
    }

    #[test]
    fn test_severity_thresholds() {
        assert_eq!(severity(dec!(3000), dec!(5000)), Severity::Low);
        assert_eq!(severity(dec!(5000), dec!(5000)), Severity::Low);
        assert_eq!(severity(dec!(5000.01), dec!(5000)), Severity::Medium);
        assert_eq!(severity(dec!(10000), dec!(5000)), Severity::Medium);
        assert_eq!(severity(dec!(10001), dec!(5000)), Severity::High);
    }

    #[test]
    fn test_defaulter_stats() {
        let stats = defaulter_stats([
            (dec!(15000), Severity::High),
            (dec!(8000), Severity::Medium),
            (dec!(3000), Severity::Low),
            (dec!(1000), Severity::Low),
        ]);
        assert_eq!(stats.total_defaulters, 4);
        assert_eq!(stats.total_pending_amount, dec!(27000));
        assert_eq!(
            stats.severity_breakdown,
            SeverityBreakdown { high: 1, medium: 1, low: 2 }
        );
        assert_eq!(defaulter_stats([]), DefaulterStats::default());
    }
}
