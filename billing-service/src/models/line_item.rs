//! Line item model: one priced row on a job.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Line item on a job.
///
/// `serial_no` is dense and 1-based; the persistence path assigns it from
/// the submitted item order. `buy_price` is the cost basis used for profit
/// reporting and is never shown on customer documents. `vat_amount` is
/// retained as a real column even though the current business rule computes
/// it as zero.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LineItem {
    pub line_item_id: Uuid,
    pub job_id: Uuid,
    pub owner_id: Uuid,
    pub serial_no: i32,
    pub description: String,
    pub extra_details: Option<String>,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: Decimal,
    pub buy_price: Decimal,
    pub discount_percent: Decimal,
    pub vat_rate: Decimal,
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
    pub auto_calculate_sqft: bool,
    pub calculated_sqft: Option<Decimal>,
    pub created_utc: DateTime<Utc>,
}
