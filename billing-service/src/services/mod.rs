pub mod database;
pub mod metrics;
pub mod pricing;
pub mod totals;

pub use database::Database;
pub use metrics::{get_metrics, init_metrics};
