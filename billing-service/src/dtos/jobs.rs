//! Request/response DTOs for job endpoints.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Expense, ItemWithMeasurements, Job, JobStatus};

/// One measurement in a job payload.
#[derive(Debug, Clone, Deserialize)]
pub struct MeasurementPayload {
    #[serde(default)]
    pub width_feet: i32,
    #[serde(default)]
    pub width_inches: i32,
    #[serde(default)]
    pub height_feet: i32,
    #[serde(default)]
    pub height_inches: i32,
    #[serde(default = "default_pieces")]
    pub quantity: i32,
    pub description: Option<String>,
}

fn default_pieces() -> i32 {
    1
}

/// One line item in a job payload. Missing numeric fields default to zero
/// in the calculator; serials are assigned from submission order.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemPayload {
    #[serde(default)]
    pub description: String,
    pub extra_details: Option<String>,
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit: String,
    pub unit_price: Option<Decimal>,
    pub buy_price: Option<Decimal>,
    pub discount_percent: Option<Decimal>,
    pub vat_rate: Option<Decimal>,
    #[serde(default)]
    pub auto_calculate_sqft: bool,
    pub calculated_sqft: Option<Decimal>,
    #[serde(default)]
    pub measurements: Vec<MeasurementPayload>,
}

/// Create/update payload for a job.
///
/// `items: None` selects the status-only update path: scalar fields are
/// patched and the stored financial fields are preserved verbatim.
/// `items: Some(..)` replaces the full item set and recomputes financials.
#[derive(Debug, Clone, Deserialize)]
pub struct JobPayload {
    pub customer_id: Uuid,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub location: String,
    pub status: Option<JobStatus>,
    pub job_date: Option<NaiveDate>,
    pub quotation_date: Option<NaiveDate>,
    pub challan_date: Option<NaiveDate>,
    pub bill_date: Option<NaiveDate>,
    pub bill_number: Option<String>,
    pub bbl_bill_number: Option<String>,
    pub challan_number: Option<String>,
    pub discount_percent: Option<Decimal>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub topsheet_id: Option<Uuid>,
    pub items: Option<Vec<LineItemPayload>>,
}

/// Full job response: the materialized snapshot plus derived figures.
#[derive(Debug, Clone, Serialize)]
pub struct JobResponse {
    pub job: Job,
    pub items: Vec<ItemWithMeasurements>,
    pub expenses: Vec<Expense>,
    /// Recomputed total (stored total is advisory only).
    pub effective_total: Decimal,
    pub total_expenses: Decimal,
    pub expected_profit: Decimal,
}

/// One row in a job listing.
#[derive(Debug, Clone, Serialize)]
pub struct JobRow {
    #[serde(flatten)]
    pub job: Job,
    /// Recomputed total for display.
    pub effective_total: Decimal,
}

/// Paginated job listing.
#[derive(Debug, Clone, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobRow>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}
