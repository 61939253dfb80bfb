//! Chit group, membership and month request/response models

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::entities::sea_orm_active_enums::ChitMonthStatus;
use crate::entities::{chit_memberships, chit_months, chits};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChitRequest {
    pub name: String,
    pub total_amount: Decimal,
    pub total_months: i32,
    pub start_date: Option<NaiveDate>,
}

/// Upper bound on group length (and therefore on members per group)
pub const MAX_TOTAL_MONTHS: i32 = 120;

impl CreateChitRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        if self.total_amount <= Decimal::ZERO {
            return Err("total_amount must be greater than zero".to_string());
        }
        if self.total_amount.scale() > 2 {
            return Err("total_amount cannot have more than 2 decimal places".to_string());
        }
        if self.total_months < 1 || self.total_months > MAX_TOTAL_MONTHS {
            return Err(format!(
                "total_months must be between 1 and {}",
                MAX_TOTAL_MONTHS
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChitListQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChitResponse {
    pub id: i32,
    pub name: String,
    pub total_amount: Decimal,
    pub total_months: i32,
    pub monthly_amount: Decimal,
    pub start_date: Option<NaiveDate>,
    pub is_active: bool,
    pub member_count: u64,
    pub created_at: DateTime<FixedOffset>,
}

impl ChitResponse {
    pub fn from_model(chit: chits::Model, member_count: u64) -> Self {
        Self {
            id: chit.id,
            name: chit.name,
            total_amount: chit.total_amount,
            total_months: chit.total_months,
            monthly_amount: chit.monthly_amount,
            start_date: chit.start_date,
            is_active: chit.is_active,
            member_count,
            created_at: chit.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMembershipRequest {
    #[serde(alias = "user_id")]
    pub member_id: i32,
    pub slot_number: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipResponse {
    pub id: i32,
    pub chit_id: i32,
    pub member_id: i32,
    pub member_name: String,
    pub member_phone: String,
    pub slot_number: i32,
    pub join_date: DateTime<FixedOffset>,
    pub is_active: bool,
}

impl MembershipResponse {
    pub fn new(membership: chit_memberships::Model, member_name: String, member_phone: String) -> Self {
        Self {
            id: membership.id,
            chit_id: membership.chit_id,
            member_id: membership.member_id,
            member_name,
            member_phone,
            slot_number: membership.slot_number,
            join_date: membership.join_date,
            is_active: membership.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipListResponse {
    pub chit_id: i32,
    pub chit_name: String,
    pub total_slots: i32,
    pub members: Vec<MembershipResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChitMonthResponse {
    pub id: i32,
    pub chit_id: i32,
    pub month_number: i32,
    pub status: ChitMonthStatus,
    pub auction_date: Option<NaiveDate>,
    pub winner_member_id: Option<i32>,
    pub payout_amount: Option<Decimal>,
    pub admin_profit: Option<Decimal>,
    /// Sum of payment credits booked against this month
    pub total_collected: Decimal,
}

impl ChitMonthResponse {
    pub fn new(month: chit_months::Model, total_collected: Decimal) -> Self {
        Self {
            id: month.id,
            chit_id: month.chit_id,
            month_number: month.month_number,
            status: month.status,
            auction_date: month.auction_date,
            winner_member_id: month.winner_member_id,
            payout_amount: month.payout_amount,
            admin_profit: month.admin_profit,
            total_collected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChitMonthListResponse {
    pub chit_id: i32,
    pub chit_name: String,
    pub total_months: i32,
    pub months: Vec<ChitMonthResponse>,
}

/// Manual record of a month's auction result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordMonthResultRequest {
    pub auction_date: NaiveDate,
    #[serde(alias = "winner_user_id")]
    pub winner_member_id: i32,
    pub payout_amount: Decimal,
    /// Defaults to the configured commission of the chit total
    pub admin_profit: Option<Decimal>,
}

impl RecordMonthResultRequest {
    pub fn validate(&self, total_amount: Decimal) -> Result<(), String> {
        if self.payout_amount <= Decimal::ZERO {
            return Err("payout_amount must be greater than zero".to_string());
        }
        if self.payout_amount > total_amount {
            return Err("payout_amount cannot exceed the chit total_amount".to_string());
        }
        if self.payout_amount.scale() > 2 {
            return Err("payout_amount cannot have more than 2 decimal places".to_string());
        }
        if let Some(profit) = self.admin_profit {
            if profit <= Decimal::ZERO {
                return Err("admin_profit must be greater than zero".to_string());
            }
            if profit.scale() > 2 {
                return Err("admin_profit cannot have more than 2 decimal places".to_string());
            }
        }
        Ok(())
    }
}
