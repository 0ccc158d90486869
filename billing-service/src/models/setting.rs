//! Settings store model: one JSON value per key per owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted settings row. The renderer style configuration lives under
/// the `document_style` key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Setting {
    pub owner_id: Uuid,
    pub key: String,
    pub value: serde_json::Value,
    pub updated_utc: DateTime<Utc>,
}
