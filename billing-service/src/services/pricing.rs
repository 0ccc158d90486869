//! Pricing engine: the per-line-item calculator and the measurement area
//! computation. Everything here is pure and deliberately permissive:
//! missing numeric inputs are treated as zero so partially-filled draft
//! data never raises.

use rust_decimal::Decimal;

/// Derived financial fields for one line item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculatedLine {
    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub vat_amount: Decimal,
    pub total: Decimal,
}

/// Calculate one line item.
///
/// VAT is computed as zero by explicit business rule; the field is kept so
/// renderers and rollups continue to display/sum it (it stays zero unless a
/// caller writes the column directly).
pub fn calculate_line_item(
    quantity: Option<Decimal>,
    unit_price: Option<Decimal>,
    discount_percent: Option<Decimal>,
) -> CalculatedLine {
    let quantity = quantity.unwrap_or(Decimal::ZERO);
    let unit_price = unit_price.unwrap_or(Decimal::ZERO);
    let discount_percent = discount_percent.unwrap_or(Decimal::ZERO);

    let subtotal = quantity * unit_price;
    let discount_amount = subtotal * discount_percent / Decimal::from(100);
    let vat_amount = Decimal::ZERO;
    let total = subtotal - discount_amount + vat_amount;

    CalculatedLine {
        subtotal,
        discount_amount,
        vat_amount,
        total,
    }
}

/// Area of one measurement in square feet, at full precision:
/// `((width_feet + width_inches/12) * (height_feet + height_inches/12)) * quantity`.
///
/// Negative components contribute zero rather than raising.
pub fn measurement_area(
    width_feet: i32,
    width_inches: i32,
    height_feet: i32,
    height_inches: i32,
    quantity: i32,
) -> Decimal {
    let twelve = Decimal::from(12);
    let width = Decimal::from(width_feet.max(0)) + Decimal::from(width_inches.max(0)) / twelve;
    let height = Decimal::from(height_feet.max(0)) + Decimal::from(height_inches.max(0)) / twelve;
    width * height * Decimal::from(quantity.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_line_item_basic() {
        let line = calculate_line_item(Some(dec("10")), Some(dec("150")), None);
        assert_eq!(line.subtotal, dec("1500"));
        assert_eq!(line.discount_amount, Decimal::ZERO);
        assert_eq!(line.vat_amount, Decimal::ZERO);
        assert_eq!(line.total, dec("1500"));
    }

    #[test]
    fn test_line_item_discount() {
        let line = calculate_line_item(Some(dec("4")), Some(dec("250")), Some(dec("10")));
        assert_eq!(line.subtotal, dec("1000"));
        assert_eq!(line.discount_amount, dec("100"));
        assert_eq!(line.total, dec("900"));
    }

    #[test]
    fn test_line_item_missing_inputs_default_to_zero() {
        let line = calculate_line_item(None, None, None);
        assert_eq!(line.subtotal, Decimal::ZERO);
        assert_eq!(line.total, Decimal::ZERO);
    }

    #[test]
    fn test_line_item_is_pure() {
        let a = calculate_line_item(Some(dec("3.5")), Some(dec("99.99")), Some(dec("5")));
        let b = calculate_line_item(Some(dec("3.5")), Some(dec("99.99")), Some(dec("5")));
        assert_eq!(a, b);
    }

    #[test]
    fn test_vat_always_zero() {
        let line = calculate_line_item(Some(dec("7")), Some(dec("123.45")), Some(dec("15")));
        assert_eq!(line.vat_amount, Decimal::ZERO);
        assert_eq!(line.total, line.subtotal - line.discount_amount);
    }

    #[test]
    fn test_measurement_area() {
        // 2'6" x 3'0" x 2 pcs = 2.5 * 3 * 2 = 15
        assert_eq!(measurement_area(2, 6, 3, 0, 2), dec("15"));
    }

    #[test]
    fn test_measurement_area_negative_clamps_to_zero() {
        assert_eq!(measurement_area(-1, -5, 3, 0, 2), Decimal::ZERO);
    }

    #[test]
    fn test_measurement_area_pure_inches() {
        // 6" x 6" = 0.5 * 0.5 = 0.25 sqft
        assert_eq!(measurement_area(0, 6, 0, 6, 1), dec("0.25"));
    }
}
