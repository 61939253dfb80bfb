//! Dues, payments, adjustments and the account views derived from the
//! ledger. Entries are only ever inserted; corrections are new
//! `adjustment` rows.

use std::collections::HashMap;

use chrono::{Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use tracing::info;

use crate::entities::prelude::*;
use crate::entities::sea_orm_active_enums::{EntryType, LedgerSource};
use crate::entities::{chit_memberships, chits, ledger_entries, members, payments};
use crate::error::{ApiError, ApiResult};
use crate::models::account::{
    AdjustmentRequest, DashboardResponse, DefaulterEntry, GenerateDuesResponse, LedgerListQuery,
    MemberAccountResponse, MemberChitAccount, PaymentListQuery, PaymentMonthShare,
    PaymentPreviewQuery, PaymentPreviewResponse, PaymentRecord, PaymentRequest, PaymentResponse,
};
use crate::services::aggregation::{self, DefaulterStats, Page};
use crate::services::allocation::{allocate_fifo, PaymentAllocation};
use crate::services::chits::{find_chit, find_membership, find_month, member_names};
use crate::services::members::find_member;
use crate::services::reconciliation::{member_month_balances, month_tally};

/// `reference_type` of the credits a payment books
const PAYMENT_REFERENCE: &str = "payment";

/// Due date of `month_number` for a chit starting on `start_date`
pub fn due_date_for(start_date: Option<NaiveDate>, month_number: i32) -> Option<NaiveDate> {
    let offset = u32::try_from(month_number - 1).ok()?;
    start_date?.checked_add_months(Months::new(offset))
}

/// Book one `monthly_due` debit per active member for a month
pub async fn generate_dues(
    db: &DatabaseConnection,
    chit_id: i32,
    month_number: i32,
) -> ApiResult<GenerateDuesResponse> {
    let txn = db.begin().await?;

    let chit = find_chit(&txn, chit_id).await?;
    if month_number < 1 || month_number > chit.total_months {
        return Err(ApiError::validation(format!(
            "month_number must be between 1 and {}",
            chit.total_months
        )));
    }
    let month = find_month(&txn, chit_id, month_number).await?;

    let already = LedgerEntries::find()
        .filter(ledger_entries::Column::ChitId.eq(chit_id))
        .filter(ledger_entries::Column::MonthNumber.eq(month_number))
        .filter(ledger_entries::Column::Source.eq(LedgerSource::MonthlyDue))
        .count(&txn)
        .await?;
    if already > 0 {
        return Err(ApiError::validation(format!(
            "dues for month {} of chit {} were already generated",
            month_number, chit_id
        )));
    }

    let memberships = ChitMemberships::find()
        .filter(chit_memberships::Column::ChitId.eq(chit_id))
        .filter(chit_memberships::Column::IsActive.eq(true))
        .order_by_asc(chit_memberships::Column::SlotNumber)
        .all(&txn)
        .await?;
    if memberships.is_empty() {
        return Err(ApiError::validation(format!(
            "chit {} has no active members",
            chit_id
        )));
    }

    let due_date = due_date_for(chit.start_date, month_number);
    let now = Utc::now().fixed_offset();
    let entries = memberships.iter().map(|membership| ledger_entries::ActiveModel {
        member_id: Set(membership.member_id),
        chit_id: Set(chit_id),
        month_number: Set(Some(month_number)),
        entry_type: Set(EntryType::Debit),
        amount: Set(chit.monthly_amount),
        source: Set(LedgerSource::MonthlyDue),
        due_date: Set(due_date),
        reference_id: Set(Some(month.id)),
        reference_type: Set(Some("chit_month".to_string())),
        notes: Set(None),
        created_at: Set(now),
        ..Default::default()
    });
    LedgerEntries::insert_many(entries).exec(&txn).await?;

    txn.commit().await?;

    info!(
        chit_id,
        month_number,
        members = memberships.len(),
        amount = %chit.monthly_amount,
        "Monthly dues generated"
    );
    Ok(GenerateDuesResponse {
        chit_id,
        month_number,
        amount_per_member: chit.monthly_amount,
        due_date,
        entries_created: memberships.len() as u64,
    })
}

/// (month_number, pending) for every month the member still owes on
async fn outstanding_months<C: ConnectionTrait>(
    db: &C,
    member_id: i32,
    chit_id: i32,
) -> ApiResult<Vec<(i32, Decimal)>> {
    let entries = LedgerEntries::find()
        .filter(ledger_entries::Column::MemberId.eq(member_id))
        .filter(ledger_entries::Column::ChitId.eq(chit_id))
        .all(db)
        .await?;

    Ok(member_month_balances(&entries)
        .into_iter()
        .filter_map(|((_, _, month_number), balance)| Some((month_number?, balance.outstanding())))
        .filter(|(_, pending)| *pending > Decimal::ZERO)
        .collect())
}

async fn plan_payment<C: ConnectionTrait>(
    db: &C,
    member_id: i32,
    chit_id: i32,
    amount: Decimal,
) -> ApiResult<PaymentAllocation> {
    find_member(db, member_id).await?;
    find_chit(db, chit_id).await?;
    if find_membership(db, chit_id, member_id).await?.is_none() {
        return Err(ApiError::validation(format!(
            "member {} is not in chit {}",
            member_id, chit_id
        )));
    }
    let outstanding = outstanding_months(db, member_id, chit_id).await?;
    Ok(allocate_fifo(&outstanding, amount))
}

/// Allocation a payment would receive, without recording anything
pub async fn preview_payment(
    db: &DatabaseConnection,
    query: PaymentPreviewQuery,
) -> ApiResult<PaymentPreviewResponse> {
    query.validate().map_err(ApiError::Validation)?;
    let plan = plan_payment(db, query.member_id, query.chit_id, query.amount).await?;

    Ok(PaymentPreviewResponse {
        member_id: query.member_id,
        chit_id: query.chit_id,
        amount: query.amount,
        allocations: plan.allocations,
        advance_amount: plan.advance_amount,
    })
}

/// Record a payment and spread it over the oldest outstanding months.
/// Whatever is left becomes one advance credit with no month.
pub async fn record_payment(db: &DatabaseConnection, req: PaymentRequest) -> ApiResult<PaymentResponse> {
    req.validate().map_err(ApiError::Validation)?;

    let txn = db.begin().await?;
    let plan = plan_payment(&txn, req.member_id, req.chit_id, req.amount).await?;

    let now = Utc::now().fixed_offset();
    let payment = payments::ActiveModel {
        member_id: Set(req.member_id),
        chit_id: Set(req.chit_id),
        amount: Set(req.amount),
        mode: Set(req.mode),
        notes: Set(req.notes.clone()),
        paid_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    let credit = |month_number: Option<i32>, amount: Decimal, source: LedgerSource| {
        ledger_entries::ActiveModel {
            member_id: Set(req.member_id),
            chit_id: Set(req.chit_id),
            month_number: Set(month_number),
            entry_type: Set(EntryType::Credit),
            amount: Set(amount),
            source: Set(source),
            due_date: Set(None),
            reference_id: Set(Some(payment.id)),
            reference_type: Set(Some(PAYMENT_REFERENCE.to_string())),
            notes: Set(req.notes.clone()),
            created_at: Set(now),
            ..Default::default()
        }
    };

    let mut ledger_entry_ids = Vec::with_capacity(plan.allocations.len() + 1);
    for allocation in &plan.allocations {
        let entry = credit(Some(allocation.month_number), allocation.amount, LedgerSource::Payment)
            .insert(&txn)
            .await?;
        ledger_entry_ids.push(entry.id);
    }
    if plan.advance_amount > Decimal::ZERO {
        let entry = credit(None, plan.advance_amount, LedgerSource::Advance)
            .insert(&txn)
            .await?;
        ledger_entry_ids.push(entry.id);
    }

    txn.commit().await?;

    info!(
        payment_id = payment.id,
        member_id = req.member_id,
        chit_id = req.chit_id,
        amount = %req.amount,
        months = plan.allocations.len(),
        advance = %plan.advance_amount,
        "Payment recorded"
    );
    Ok(PaymentResponse {
        payment_id: payment.id,
        member_id: payment.member_id,
        chit_id: payment.chit_id,
        amount: payment.amount,
        mode: payment.mode,
        allocations: plan.allocations,
        advance_amount: plan.advance_amount,
        ledger_entry_ids,
    })
}

/// Payments newest first, optionally narrowed to a member, a chit or the
/// payments that paid into a given month
pub async fn list_payments(
    db: &DatabaseConnection,
    query: &PaymentListQuery,
    default_per_page: u64,
) -> ApiResult<Page<PaymentRecord>> {
    query.validate().map_err(ApiError::Validation)?;
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(default_per_page);

    let mut condition = Condition::all();
    if let Some(member_id) = query.member_id {
        condition = condition.add(payments::Column::MemberId.eq(member_id));
    }
    if let Some(chit_id) = query.chit_id {
        condition = condition.add(payments::Column::ChitId.eq(chit_id));
    }
    if let Some(month_number) = query.month_number {
        let mut shares = LedgerEntries::find()
            .filter(ledger_entries::Column::ReferenceType.eq(PAYMENT_REFERENCE))
            .filter(ledger_entries::Column::MonthNumber.eq(month_number));
        if let Some(chit_id) = query.chit_id {
            shares = shares.filter(ledger_entries::Column::ChitId.eq(chit_id));
        }
        let payment_ids: Vec<i32> = shares
            .all(db)
            .await?
            .into_iter()
            .filter_map(|e| e.reference_id)
            .collect();
        condition = condition.add(payments::Column::Id.is_in(payment_ids));
    }

    let paginator = Payments::find()
        .filter(condition)
        .order_by_desc(payments::Column::PaidAt)
        .order_by_desc(payments::Column::Id)
        .paginate(db, per_page);

    let total = paginator.num_items().await?;
    let rows = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        items: payment_records(db, rows).await?,
        total,
        page,
        per_page,
        total_pages: aggregation::total_pages(total, per_page),
    })
}

pub async fn get_payment(db: &DatabaseConnection, payment_id: i32) -> ApiResult<PaymentRecord> {
    let payment = Payments::find_by_id(payment_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("payment {} not found", payment_id)))?;

    payment_records(db, vec![payment])
        .await?
        .pop()
        .ok_or_else(|| ApiError::not_found(format!("payment {} not found", payment_id)))
}

/// Attach names and the month split booked for each payment
async fn payment_records(
    db: &DatabaseConnection,
    rows: Vec<payments::Model>,
) -> ApiResult<Vec<PaymentRecord>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let credits = LedgerEntries::find()
        .filter(ledger_entries::Column::ReferenceType.eq(PAYMENT_REFERENCE))
        .filter(ledger_entries::Column::ReferenceId.is_in(rows.iter().map(|p| p.id)))
        .order_by_asc(ledger_entries::Column::Id)
        .all(db)
        .await?;
    let mut by_payment: HashMap<i32, Vec<ledger_entries::Model>> = HashMap::new();
    for credit in credits {
        if let Some(payment_id) = credit.reference_id {
            by_payment.entry(payment_id).or_default().push(credit);
        }
    }

    let names = member_names(db, rows.iter().map(|p| p.member_id)).await?;
    let chit_names: HashMap<i32, String> = Chits::find()
        .filter(chits::Column::Id.is_in(rows.iter().map(|p| p.chit_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    Ok(rows
        .into_iter()
        .map(|payment| {
            let credits = by_payment.remove(&payment.id).unwrap_or_default();
            let months = credits
                .iter()
                .filter(|c| c.source == LedgerSource::Payment)
                .filter_map(|c| {
                    Some(PaymentMonthShare {
                        month_number: c.month_number?,
                        amount: c.amount,
                    })
                })
                .collect();
            let advance_amount = credits
                .iter()
                .filter(|c| c.source == LedgerSource::Advance)
                .map(|c| c.amount)
                .sum();
            PaymentRecord {
                member_name: names
                    .get(&payment.member_id)
                    .map(|(name, _)| name.clone())
                    .unwrap_or_default(),
                chit_name: chit_names.get(&payment.chit_id).cloned().unwrap_or_default(),
                id: payment.id,
                member_id: payment.member_id,
                chit_id: payment.chit_id,
                amount: payment.amount,
                mode: payment.mode,
                notes: payment.notes,
                paid_at: payment.paid_at,
                months,
                advance_amount,
            }
        })
        .collect())
}

pub async fn create_adjustment(
    db: &DatabaseConnection,
    req: AdjustmentRequest,
) -> ApiResult<ledger_entries::Model> {
    req.validate().map_err(ApiError::Validation)?;

    find_member(db, req.member_id).await?;
    let chit = find_chit(db, req.chit_id).await?;
    if let Some(month_number) = req.month_number {
        if month_number < 1 || month_number > chit.total_months {
            return Err(ApiError::validation(format!(
                "month_number must be between 1 and {}",
                chit.total_months
            )));
        }
    }

    let entry = ledger_entries::ActiveModel {
        member_id: Set(req.member_id),
        chit_id: Set(req.chit_id),
        month_number: Set(req.month_number),
        entry_type: Set(req.entry_type),
        amount: Set(req.amount),
        source: Set(LedgerSource::Adjustment),
        due_date: Set(None),
        reference_id: Set(None),
        reference_type: Set(None),
        notes: Set(Some(req.notes.trim().to_string())),
        created_at: Set(Utc::now().fixed_offset()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(
        entry_id = entry.id,
        member_id = entry.member_id,
        chit_id = entry.chit_id,
        entry_type = ?entry.entry_type,
        amount = %entry.amount,
        "Adjustment booked"
    );
    Ok(entry)
}

/// Filtered ledger, newest first, offset-paginated
pub async fn ledger_page(
    db: &DatabaseConnection,
    query: &LedgerListQuery,
    default_per_page: u64,
) -> ApiResult<Page<ledger_entries::Model>> {
    query.validate().map_err(ApiError::Validation)?;
    let page = query.page.unwrap_or(1);
    let per_page = query.per_page.unwrap_or(default_per_page);

    let paginator = LedgerEntries::find()
        .filter(query.filter().condition())
        .order_by_desc(ledger_entries::Column::CreatedAt)
        .order_by_desc(ledger_entries::Column::Id)
        .paginate(db, per_page);

    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page - 1).await?;

    Ok(Page {
        items,
        total,
        page,
        per_page,
        total_pages: aggregation::total_pages(total, per_page),
    })
}

pub async fn dashboard(db: &DatabaseConnection, today: NaiveDate) -> ApiResult<DashboardResponse> {
    let entries = LedgerEntries::find().all(db).await?;
    let active_members = Members::find()
        .filter(members::Column::IsActive.eq(true))
        .count(db)
        .await?;
    let active_chits = Chits::find()
        .filter(chits::Column::IsActive.eq(true))
        .count(db)
        .await?;

    Ok(DashboardResponse {
        totals: aggregation::dashboard_totals(&entries, today),
        active_members,
        active_chits,
    })
}

/// A member's standing in every chit they belong to
pub async fn member_account(
    db: &DatabaseConnection,
    member_id: i32,
) -> ApiResult<MemberAccountResponse> {
    let member = find_member(db, member_id).await?;

    let memberships = ChitMemberships::find()
        .filter(chit_memberships::Column::MemberId.eq(member_id))
        .all(db)
        .await?;
    let chits: HashMap<i32, chits::Model> = Chits::find()
        .filter(chits::Column::Id.is_in(memberships.iter().map(|m| m.chit_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let entries = LedgerEntries::find()
        .filter(ledger_entries::Column::MemberId.eq(member_id))
        .all(db)
        .await?;

    let mut accounts = Vec::with_capacity(memberships.len());
    for membership in &memberships {
        let Some(chit) = chits.get(&membership.chit_id) else {
            continue;
        };
        let balances = member_month_balances(entries.iter().filter(|e| e.chit_id == chit.id));

        accounts.push(MemberChitAccount {
            chit_id: chit.id,
            chit_name: chit.name.clone(),
            slot_number: membership.slot_number,
            monthly_amount: chit.monthly_amount,
            total_due: balances.values().map(|b| b.due).sum(),
            total_paid: balances.values().map(|b| b.paid).sum(),
            total_pending: balances.values().map(|b| b.outstanding()).sum(),
            total_advance: balances.values().map(|b| b.overpaid()).sum(),
            months: month_tally(&entries, member_id, chit.id, chit.total_months),
        });
    }
    accounts.sort_by_key(|a| a.chit_id);

    Ok(MemberAccountResponse {
        member_id,
        member_name: member.name,
        total_due: accounts.iter().map(|a| a.total_due).sum(),
        total_paid: accounts.iter().map(|a| a.total_paid).sum(),
        total_pending: accounts.iter().map(|a| a.total_pending).sum(),
        chits: accounts,
    })
}

/// Members owing on generated dues, largest balance first
pub async fn defaulters(db: &DatabaseConnection, chit_id: Option<i32>) -> ApiResult<Vec<DefaulterEntry>> {
    let mut query = LedgerEntries::find();
    if let Some(chit_id) = chit_id {
        find_chit(db, chit_id).await?;
        query = query.filter(ledger_entries::Column::ChitId.eq(chit_id));
    }
    let entries = query.all(db).await?;
    let arrears = aggregation::arrears(&entries);

    let chits: HashMap<i32, chits::Model> = Chits::find()
        .filter(chits::Column::Id.is_in(arrears.iter().map(|a| a.chit_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let members: HashMap<i32, members::Model> = Members::find()
        .filter(members::Column::Id.is_in(arrears.iter().map(|a| a.member_id)))
        .all(db)
        .await?
        .into_iter()
        .map(|m| (m.id, m))
        .collect();

    let mut rows: Vec<DefaulterEntry> = arrears
        .into_iter()
        .filter_map(|a| {
            let chit = chits.get(&a.chit_id)?;
            let member = members.get(&a.member_id)?;
            Some(DefaulterEntry {
                member_id: member.id,
                member_name: member.name.clone(),
                phone: member.phone.clone(),
                chit_id: chit.id,
                chit_name: chit.name.clone(),
                severity: aggregation::severity(a.pending_amount, chit.monthly_amount),
                pending_amount: a.pending_amount,
                pending_months: a.pending_months,
            })
        })
        .collect();
    rows.sort_by(|a, b| {
        b.pending_amount
            .cmp(&a.pending_amount)
            .then(a.member_id.cmp(&b.member_id))
    });
    Ok(rows)
}

/// Counts and total of what `defaulters` would list
pub async fn defaulter_stats(db: &DatabaseConnection, chit_id: Option<i32>) -> ApiResult<DefaulterStats> {
    let rows = defaulters(db, chit_id).await?;
    Ok(aggregation::defaulter_stats(
        rows.iter().map(|r| (r.pending_amount, r.severity)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_due_date_offsets_by_month() {
        let start = Some(date(2026, 1, 15));
        assert_eq!(due_date_for(start, 1), Some(date(2026, 1, 15)));
        assert_eq!(due_date_for(start, 3), Some(date(2026, 3, 15)));
        assert_eq!(due_date_for(start, 13), Some(date(2027, 1, 15)));
    }

    #[test]
    fn test_due_date_clamps_to_month_end() {
        assert_eq!(due_date_for(Some(date(2026, 1, 31)), 2), Some(date(2026, 2, 28)));
    }

    #[test]
    fn test_due_date_without_start() {
        assert_eq!(due_date_for(None, 2), None);
        assert_eq!(due_date_for(Some(date(2026, 1, 1)), 0), None);
    }
}
