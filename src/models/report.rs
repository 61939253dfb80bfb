use serde::Deserialize;

/// Query parameters for GET /reports/profit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfitQuery {
    /// Only chits that are still running
    pub active: Option<bool>,
    /// Only months auctioned in this calendar year
    pub year: Option<i32>,
}

impl ProfitQuery {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(year) = self.year {
            if !(2000..=2100).contains(&year) {
                return Err("year must be between 2000 and 2100".to_string());
            }
        }
        Ok(())
    }
}
