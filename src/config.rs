//! Runtime configuration read from the environment (and `.env` via dotenvy).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::env;
use std::str::FromStr;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_COMMISSION_RATE: Decimal = dec!(0.05);
const DEFAULT_PER_PAGE: u64 = 50;
pub const MAX_PER_PAGE: u64 = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    /// Admin commission as a fraction of the chit total amount
    pub commission_rate: Decimal,
    pub default_per_page: u64,
}

impl AppConfig {
    /// Build the config from process environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").ok_or("DATABASE_URL must be set")?;
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let commission_rate = match lookup("COMMISSION_RATE") {
            Some(raw) => Decimal::from_str(raw.trim())
                .map_err(|e| format!("COMMISSION_RATE '{}' is not a decimal: {}", raw, e))?,
            None => DEFAULT_COMMISSION_RATE,
        };
        if commission_rate <= Decimal::ZERO || commission_rate >= Decimal::ONE {
            return Err(format!(
                "COMMISSION_RATE must be in (0, 1), got {}",
                commission_rate
            ));
        }

        let default_per_page = match lookup("DEFAULT_PER_PAGE") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| format!("DEFAULT_PER_PAGE '{}' is not a number: {}", raw, e))?,
            None => DEFAULT_PER_PAGE,
        };
        if default_per_page == 0 || default_per_page > MAX_PER_PAGE {
            return Err(format!(
                "DEFAULT_PER_PAGE must be between 1 and {}",
                MAX_PER_PAGE
            ));
        }

        Ok(Self {
            database_url,
            bind_addr,
            commission_rate,
            default_per_page,
        })
    }

    /// Config for a given database with every other value defaulted
    pub fn with_database_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            commission_rate: DEFAULT_COMMISSION_RATE,
            default_per_page: DEFAULT_PER_PAGE,
        }
    }
}
