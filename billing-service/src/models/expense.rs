//! Expense model: a cost entry against a job.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Expense category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    Material,
    Labor,
    Transport,
    Other,
}

impl ExpenseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExpenseCategory::Material => "material",
            ExpenseCategory::Labor => "labor",
            ExpenseCategory::Transport => "transport",
            ExpenseCategory::Other => "other",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "material" => ExpenseCategory::Material,
            "labor" => ExpenseCategory::Labor,
            "transport" => ExpenseCategory::Transport,
            _ => ExpenseCategory::Other,
        }
    }
}

/// Expense record. `is_active = false` is a soft delete: the row is kept
/// for audit but excluded from every total.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub expense_id: Uuid,
    pub job_id: Uuid,
    pub owner_id: Uuid,
    pub description: String,
    pub category: String,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
}

/// Input for creating an expense.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExpense {
    pub description: String,
    pub category: ExpenseCategory,
    pub amount: Decimal,
    pub expense_date: NaiveDate,
}

/// Input for updating an expense. Setting `active: Some(false)` soft-deletes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExpense {
    pub description: Option<String>,
    pub category: Option<ExpenseCategory>,
    pub amount: Option<Decimal>,
    pub expense_date: Option<NaiveDate>,
    pub active: Option<bool>,
}
