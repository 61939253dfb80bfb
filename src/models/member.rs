use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::entities::members;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMemberRequest {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
}

impl CreateMemberRequest {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name cannot be empty".to_string());
        }
        if self.name.chars().count() > 100 {
            return Err("name cannot exceed 100 characters".to_string());
        }
        let phone = self.phone.trim();
        if phone.is_empty() || phone.len() > 15 {
            return Err("phone must be 1 to 15 characters".to_string());
        }
        if !phone.chars().all(|c| c.is_ascii_digit() || c == '+') {
            return Err("phone may only contain digits and '+'".to_string());
        }
        if let Some(email) = &self.email {
            if !email.contains('@') {
                return Err("email is not valid".to_string());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MemberListQuery {
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberResponse {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<FixedOffset>,
}

impl From<members::Model> for MemberResponse {
    fn from(m: members::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            phone: m.phone,
            email: m.email,
            address: m.address,
            is_active: m.is_active,
            created_at: m.created_at,
        }
    }
}
