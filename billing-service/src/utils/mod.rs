//! Shared helpers: reference number generation and money formatting.

pub mod money;

use chrono::{Datelike, Utc};
use rand::Rng;

/// Generate a job reference number: prefix + year + zero-padded month +
/// random zero-padded digits. Not guaranteed globally unique; the unique
/// constraint on (owner_id, ref_number) is the real guard.
pub fn generate_ref_number() -> String {
    numbered("JOB")
}

/// Generate a bill number for the bill milestone.
pub fn generate_bill_number() -> String {
    numbered("BILL")
}

/// Generate a challan number for the challan milestone.
pub fn generate_challan_number() -> String {
    numbered("CH")
}

/// Generate a topsheet number.
pub fn generate_topsheet_number() -> String {
    numbered("TS")
}

fn numbered(prefix: &str) -> String {
    let now = Utc::now();
    let serial: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{}-{}{:02}-{:04}", prefix, now.year(), now.month(), serial)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ref_number_shape() {
        let n = generate_ref_number();
        assert!(n.starts_with("JOB-"));
        // JOB-YYYYMM-NNNN
        let parts: Vec<&str> = n.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].len(), 6);
        assert_eq!(parts[2].len(), 4);
    }
}
