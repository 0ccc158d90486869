use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Datelike;
use serde::Deserialize;
use service_core::error::AppError;

use crate::middleware::OwnerId;
use crate::services::totals;
use crate::startup::AppState;

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub year: Option<i32>,
}

/// Monthly dashboard rollup. Jobs are bucketed by their job date and are
/// the only source of the financial figures; topsheets are counted in a
/// separate pass for reference.
pub async fn monthly_summary(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    Query(query): Query<YearQuery>,
) -> Result<impl IntoResponse, AppError> {
    let year = query.year.unwrap_or_else(|| chrono::Utc::now().year());

    let snapshots = state.db.snapshots_for_year(owner_id, year).await?;
    let topsheets = state.db.topsheets_for_year(owner_id, year).await?;

    let summary = totals::monthly_summary(year, &snapshots, &topsheets);
    Ok(Json(summary))
}
