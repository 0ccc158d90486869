//! Job model: one billable unit of work.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{Expense, LineItem, Measurement};

/// Job lifecycle status. The progression quotation -> challan -> bill is
/// caller-driven; the status is stored as a plain field and transitions are
/// not enforced here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Quotation,
    Challan,
    Bill,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Quotation => "quotation",
            JobStatus::Challan => "challan",
            JobStatus::Bill => "bill",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "challan" => JobStatus::Challan,
            "bill" => JobStatus::Bill,
            _ => JobStatus::Quotation,
        }
    }
}

/// Job record.
///
/// The stored financial fields (`subtotal`, `total_vat`, `discount_amount`,
/// `total_amount`, `amount_in_words`) are advisory caches written at
/// persist time; every read path reports totals recomputed from live line
/// items instead (see `services::totals`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub job_id: Uuid,
    pub owner_id: Uuid,
    pub customer_id: Uuid,
    pub topsheet_id: Option<Uuid>,
    pub ref_number: String,
    pub subject: String,
    pub detail: String,
    pub location: String,
    pub status: String,
    pub job_date: NaiveDate,
    pub quotation_date: Option<NaiveDate>,
    pub challan_date: Option<NaiveDate>,
    pub bill_date: Option<NaiveDate>,
    pub bill_number: Option<String>,
    pub bbl_bill_number: Option<String>,
    pub challan_number: Option<String>,
    pub discount_percent: Decimal,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub subtotal: Decimal,
    pub total_vat: Decimal,
    pub discount_amount: Decimal,
    pub total_amount: Decimal,
    pub amount_in_words: String,
    pub created_utc: DateTime<Utc>,
}

/// A line item together with its measurements, ordered by sort order.
#[derive(Debug, Clone, Serialize)]
pub struct ItemWithMeasurements {
    pub item: LineItem,
    pub measurements: Vec<Measurement>,
}

/// A fully-materialized job: the snapshot every render and rollup consumes.
#[derive(Debug, Clone, Serialize)]
pub struct JobSnapshot {
    pub job: Job,
    pub items: Vec<ItemWithMeasurements>,
    pub expenses: Vec<Expense>,
}

/// Filter parameters for listing jobs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListJobsFilter {
    /// Free-text search across ref number, subject, customer name, location.
    pub search: Option<String>,
    pub status: Option<JobStatus>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}
