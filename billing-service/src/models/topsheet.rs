//! Topsheet model: a batch of jobs billed together.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Topsheet status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopsheetStatus {
    Draft,
    Submitted,
    Approved,
    Completed,
}

impl TopsheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TopsheetStatus::Draft => "draft",
            TopsheetStatus::Submitted => "submitted",
            TopsheetStatus::Approved => "approved",
            TopsheetStatus::Completed => "completed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "submitted" => TopsheetStatus::Submitted,
            "approved" => TopsheetStatus::Approved,
            "completed" => TopsheetStatus::Completed,
            _ => TopsheetStatus::Draft,
        }
    }
}

/// Topsheet record. The customer name/address are a snapshot captured at
/// creation time, not a live join. The topsheet has no stored total field:
/// its rollup is always derived from member jobs at read time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Topsheet {
    pub topsheet_id: Uuid,
    pub owner_id: Uuid,
    pub topsheet_number: String,
    pub topsheet_date: NaiveDate,
    pub customer_name: String,
    pub customer_address: Option<String>,
    pub status: String,
    pub created_utc: DateTime<Utc>,
}
