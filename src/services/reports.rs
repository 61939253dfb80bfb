use chrono::Datelike;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};

use crate::entities::prelude::*;
use crate::entities::sea_orm_active_enums::ChitMonthStatus;
use crate::entities::{chit_months, chits};
use crate::error::{ApiError, ApiResult};
use crate::models::report::ProfitQuery;
use crate::services::aggregation::{self, ChitProfitReport, ProfitSummary};
use crate::services::chits::find_chit;

/// Admin profit across chits, optionally narrowed to running chits or one
/// auction year
pub async fn profit_summary(db: &DatabaseConnection, query: &ProfitQuery) -> ApiResult<ProfitSummary> {
    query.validate().map_err(ApiError::Validation)?;

    let mut chit_query = Chits::find();
    if let Some(active) = query.active {
        chit_query = chit_query.filter(chits::Column::IsActive.eq(active));
    }
    let chits = chit_query.order_by_asc(chits::Column::Id).all(db).await?;

    let mut months = ChitMonths::find()
        .filter(chit_months::Column::ChitId.is_in(chits.iter().map(|c| c.id)))
        .all(db)
        .await?;
    // The year narrows completed months only; pending months have no date
    if let Some(year) = query.year {
        months.retain(|m| {
            m.status != ChitMonthStatus::Completed
                || m.auction_date.is_some_and(|d| d.year() == year)
        });
    }

    Ok(aggregation::profit_summary(&chits, &months))
}

pub async fn chit_profit(db: &DatabaseConnection, chit_id: i32) -> ApiResult<ChitProfitReport> {
    let chit = find_chit(db, chit_id).await?;
    let months = ChitMonths::find()
        .filter(chit_months::Column::ChitId.eq(chit_id))
        .all(db)
        .await?;
    Ok(aggregation::profit_by_seat(&chit, &months))
}
