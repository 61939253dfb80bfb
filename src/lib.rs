// src/lib.rs

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: AppConfig,
}

pub mod entities {
    pub mod prelude;
    pub mod sea_orm_active_enums;
    pub mod members;
    pub mod chits;
    pub mod chit_memberships;
    pub mod chit_months;
    pub mod ledger_entries;
    pub mod payments;
    pub mod auctions;
    pub mod bids;
}

pub mod services {
    pub mod chit_math;
    pub mod reconciliation;
    pub mod allocation;
    pub mod aggregation;
    pub mod auction_rules;
    pub mod members;
    pub mod chits;
    pub mod ledger;
    pub mod auctions;
    pub mod reports;
}

pub mod config;
pub mod error;
pub mod models;
pub mod handlers;
pub mod routes;
