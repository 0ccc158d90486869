//! Measurement model: one width x height x pieces specification.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One physical cut/piece dimension spec owned by a line item.
///
/// `area_sqft` is stored at full precision; rounding to two decimals
/// happens only at display time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Measurement {
    pub measurement_id: Uuid,
    pub line_item_id: Uuid,
    pub owner_id: Uuid,
    pub width_feet: i32,
    pub width_inches: i32,
    pub height_feet: i32,
    pub height_inches: i32,
    pub quantity: i32,
    pub area_sqft: Decimal,
    pub description: Option<String>,
    pub sort_order: i32,
}

impl Measurement {
    /// Compact display fragment: `W'WI" x H'HI" (N pcs) = A sft`.
    ///
    /// A zero-feet component omits the feet part entirely (a pure-inch
    /// measurement never prints a stray `0'`), and an all-zero dimension
    /// pair degrades to `(N pcs) = 0.00 sft`.
    pub fn display_fragment(&self) -> String {
        let width = dimension_text(self.width_feet, self.width_inches);
        let height = dimension_text(self.height_feet, self.height_inches);
        let area = self
            .area_sqft
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        match (width, height) {
            (Some(w), Some(h)) => {
                format!("{} x {} ({} pcs) = {:.2} sft", w, h, self.quantity, area)
            }
            (Some(d), None) | (None, Some(d)) => {
                format!("{} ({} pcs) = {:.2} sft", d, self.quantity, area)
            }
            (None, None) => format!("({} pcs) = {:.2} sft", self.quantity, area),
        }
    }
}

fn dimension_text(feet: i32, inches: i32) -> Option<String> {
    let feet = feet.max(0);
    let inches = inches.max(0);
    match (feet, inches) {
        (0, 0) => None,
        (0, i) => Some(format!("{}\"", i)),
        (f, 0) => Some(format!("{}'", f)),
        (f, i) => Some(format!("{}'{}\"", f, i)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pricing::measurement_area;

    fn measurement(wf: i32, wi: i32, hf: i32, hi: i32, qty: i32) -> Measurement {
        Measurement {
            measurement_id: Uuid::new_v4(),
            line_item_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            width_feet: wf,
            width_inches: wi,
            height_feet: hf,
            height_inches: hi,
            quantity: qty,
            area_sqft: measurement_area(wf, wi, hf, hi, qty),
            description: None,
            sort_order: 0,
        }
    }

    #[test]
    fn test_fragment_full_dimensions() {
        let m = measurement(2, 6, 3, 0, 2);
        assert_eq!(m.display_fragment(), "2'6\" x 3' (2 pcs) = 15.00 sft");
    }

    #[test]
    fn test_fragment_pure_inches_omits_zero_feet() {
        let m = measurement(0, 8, 1, 0, 1);
        let fragment = m.display_fragment();
        assert!(fragment.starts_with("8\" x 1'"));
        assert!(!fragment.contains("0'"));
    }

    #[test]
    fn test_fragment_all_zero_degrades() {
        let m = measurement(0, 0, 0, 0, 3);
        assert_eq!(m.display_fragment(), "(3 pcs) = 0.00 sft");
    }
}
