//! Request/response DTOs for topsheet endpoints.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dtos::jobs::JobRow;
use crate::models::{Topsheet, TopsheetStatus};
use crate::services::totals::TopsheetRollup;

/// Create/update payload for a topsheet. `job_ids` is the full member set:
/// saving disconnects every current member first, then connects these.
#[derive(Debug, Clone, Deserialize)]
pub struct TopsheetPayload {
    pub topsheet_number: Option<String>,
    pub topsheet_date: Option<NaiveDate>,
    pub customer_name: String,
    pub customer_address: Option<String>,
    pub status: Option<TopsheetStatus>,
    #[serde(default)]
    pub job_ids: Vec<Uuid>,
}

/// Topsheet response with member jobs and the read-time rollup.
#[derive(Debug, Clone, Serialize)]
pub struct TopsheetResponse {
    pub topsheet: Topsheet,
    pub jobs: Vec<JobRow>,
    pub rollup: TopsheetRollup,
}
