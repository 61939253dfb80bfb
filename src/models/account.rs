use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::MAX_PER_PAGE;
use crate::entities::sea_orm_active_enums::{EntryType, LedgerSource, PaymentMode};
use crate::services::aggregation::{self, DashboardTotals, LedgerFilter, Severity};
use crate::services::allocation::MonthAllocation;
use crate::services::reconciliation::MonthTally;

/// Query parameters for GET /accounts/ledger
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LedgerListQuery {
    /// 1-based page number (default: 1)
    pub page: Option<u64>,
    /// Page size (default: configured, max 100)
    pub per_page: Option<u64>,
    pub entry_type: Option<EntryType>,
    pub source: Option<LedgerSource>,
    pub month_number: Option<i32>,
    pub year: Option<i32>,
    pub chit_id: Option<i32>,
    pub member_id: Option<i32>,
}

impl LedgerListQuery {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(page) = self.page {
            if page < 1 {
                return Err("page must be at least 1".to_string());
            }
        }
        if let Some(per_page) = self.per_page {
            if per_page < 1 {
                return Err("per_page must be at least 1".to_string());
            }
            if per_page > MAX_PER_PAGE {
                return Err(format!("per_page cannot exceed {}", MAX_PER_PAGE));
            }
        }
        if let Some(page) = self.page {
            let per_page = self.per_page.unwrap_or(MAX_PER_PAGE);
            if aggregation::page_offset(page, per_page).is_none() {
                return Err(format!("page {} is out of range", page));
            }
        }
        if let Some(month_number) = self.month_number {
            if month_number < 1 {
                return Err("month_number must be at least 1".to_string());
            }
        }
        Ok(())
    }

    pub fn filter(&self) -> LedgerFilter {
        LedgerFilter {
            entry_type: self.entry_type,
            source: self.source,
            month_number: self.month_number,
            year: self.year,
            chit_id: self.chit_id,
            member_id: self.member_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub member_id: i32,
    pub chit_id: i32,
    pub month_number: Option<i32>,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub notes: String,
}

impl AdjustmentRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.amount <= Decimal::ZERO {
            return Err("amount must be greater than zero".to_string());
        }
        if self.notes.trim().is_empty() {
            return Err("notes are required for an adjustment".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub member_id: i32,
    pub chit_id: i32,
    pub amount: Decimal,
    pub mode: PaymentMode,
    pub notes: Option<String>,
}

impl PaymentRequest {
    pub fn validate(&self) -> Result<(), String> {
        validate_amount(self.amount)
    }
}

/// Query parameters for GET /accounts/payments
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentListQuery {
    #[serde(alias = "user_id")]
    pub member_id: Option<i32>,
    pub chit_id: Option<i32>,
    /// Payments with a share booked against this month
    pub month_number: Option<i32>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

impl PaymentListQuery {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(per_page) = self.per_page {
            if per_page < 1 || per_page > MAX_PER_PAGE {
                return Err(format!("per_page must be between 1 and {}", MAX_PER_PAGE));
            }
        }
        if let Some(page) = self.page {
            let per_page = self.per_page.unwrap_or(MAX_PER_PAGE);
            if aggregation::page_offset(page, per_page).is_none() {
                return Err(format!("page {} is out of range", page));
            }
        }
        if let Some(month_number) = self.month_number {
            if month_number < 1 {
                return Err("month_number must be at least 1".to_string());
            }
        }
        Ok(())
    }
}

/// A stored payment with the months its amount went to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: i32,
    pub member_id: i32,
    pub member_name: String,
    pub chit_id: i32,
    pub chit_name: String,
    pub amount: Decimal,
    pub mode: PaymentMode,
    pub notes: Option<String>,
    pub paid_at: DateTime<FixedOffset>,
    pub months: Vec<PaymentMonthShare>,
    pub advance_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMonthShare {
    pub month_number: i32,
    pub amount: Decimal,
}

/// Query parameters for GET /accounts/payment-preview
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentPreviewQuery {
    pub member_id: i32,
    pub chit_id: i32,
    pub amount: Decimal,
}

impl PaymentPreviewQuery {
    pub fn validate(&self) -> Result<(), String> {
        validate_amount(self.amount)
    }
}

fn validate_amount(amount: Decimal) -> Result<(), String> {
    if amount <= Decimal::ZERO {
        return Err("amount must be greater than zero".to_string());
    }
    if amount.scale() > 2 {
        return Err("amount cannot have more than 2 decimal places".to_string());
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPreviewResponse {
    pub member_id: i32,
    pub chit_id: i32,
    pub amount: Decimal,
    pub allocations: Vec<MonthAllocation>,
    pub advance_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub payment_id: i32,
    pub member_id: i32,
    pub chit_id: i32,
    pub amount: Decimal,
    pub mode: PaymentMode,
    pub allocations: Vec<MonthAllocation>,
    pub advance_amount: Decimal,
    pub ledger_entry_ids: Vec<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateDuesResponse {
    pub chit_id: i32,
    pub month_number: i32,
    pub amount_per_member: Decimal,
    pub due_date: Option<NaiveDate>,
    pub entries_created: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    #[serde(flatten)]
    pub totals: DashboardTotals,
    pub active_members: u64,
    pub active_chits: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberChitAccount {
    pub chit_id: i32,
    pub chit_name: String,
    pub slot_number: i32,
    pub monthly_amount: Decimal,
    pub total_due: Decimal,
    pub total_paid: Decimal,
    pub total_pending: Decimal,
    /// Credits not yet tied to a month plus any overpayment on a month
    pub total_advance: Decimal,
    pub months: Vec<MonthTally>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberAccountResponse {
    pub member_id: i32,
    pub member_name: String,
    pub total_due: Decimal,
    pub total_paid: Decimal,
    pub total_pending: Decimal,
    pub chits: Vec<MemberChitAccount>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DefaulterQuery {
    pub chit_id: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaulterEntry {
    pub member_id: i32,
    pub member_name: String,
    pub phone: String,
    pub chit_id: i32,
    pub chit_name: String,
    pub pending_amount: Decimal,
    pub pending_months: Vec<i32>,
    pub severity: Severity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_ledger_query_bounds() {
        let mut query = LedgerListQuery::default();
        assert!(query.validate().is_ok());

        query.page = Some(0);
        assert!(query.validate().is_err());

        query.page = Some(2);
        query.per_page = Some(101);
        assert!(query.validate().is_err());

        query.per_page = Some(100);
        assert!(query.validate().is_ok());

        query.page = Some(u64::MAX);
        assert!(query.validate().is_err());
        query.per_page = None;
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_payment_list_query_bounds() {
        let mut query: PaymentListQuery =
            serde_json::from_str(r#"{"user_id": 4, "chit_id": 1, "month_number": 2}"#).unwrap();
        assert_eq!(query.member_id, Some(4));
        assert!(query.validate().is_ok());

        query.month_number = Some(0);
        assert!(query.validate().is_err());

        query.month_number = None;
        query.page = Some(0);
        assert!(query.validate().is_err());

        query.page = Some(u64::MAX);
        assert!(query.validate().is_err());

        query.page = Some(1);
        query.per_page = Some(0);
        assert!(query.validate().is_err());
    }

    #[test]
    fn test_ledger_query_parses_filters() {
        let query: LedgerListQuery = serde_json::from_str(
            r#"{"entry_type": "credit", "source": "payment", "month_number": 3, "year": 2026}"#,
        )
        .unwrap();
        let filter = query.filter();
        assert_eq!(filter.entry_type, Some(EntryType::Credit));
        assert_eq!(filter.source, Some(LedgerSource::Payment));
        assert_eq!(filter.month_number, Some(3));
        assert_eq!(filter.year, Some(2026));
        assert_eq!(filter.chit_id, None);
    }

    #[test]
    fn test_payment_amount_validation() {
        let mut req = PaymentRequest {
            member_id: 1,
            chit_id: 1,
            amount: dec!(2000),
            mode: PaymentMode::Cash,
            notes: None,
        };
        assert!(req.validate().is_ok());
        req.amount = dec!(0);
        assert!(req.validate().is_err());
        req.amount = dec!(10.005);
        assert!(req.validate().is_err());
    }
}
