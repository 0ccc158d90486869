//! Money display primitives: currency formatting and the number-to-words
//! converter used on job and topsheet documents.
//!
//! Words use South Asian grouping (Lakh = 10^5, Crore = 10^7), not the
//! Western thousand/million scale. One canonical implementation serves both
//! document families.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

const ONES: [&str; 20] = [
    "", "One", "Two", "Three", "Four", "Five", "Six", "Seven", "Eight", "Nine", "Ten", "Eleven",
    "Twelve", "Thirteen", "Fourteen", "Fifteen", "Sixteen", "Seventeen", "Eighteen", "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

/// Format an amount for display: fixed currency glyph, thousands
/// separators, exactly two decimals with half-up rounding. Stored values
/// keep full precision; this touches display only.
pub fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let grouped = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|c| std::str::from_utf8(c).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",");

    let sign = if negative { "-" } else { "" };
    format!("{}Tk {}.{}", sign, grouped, frac_part)
}

/// Convert an amount to words: integer part with Lakh/Crore grouping and a
/// "Taka" suffix, fractional part (x100, half-up) as "and N Paise", always
/// terminated with "Only". Zero is the special case "Zero Taka Only".
pub fn number_to_words(amount: Decimal) -> String {
    let rounded = amount
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let taka = rounded.trunc().to_u64().unwrap_or(0);
    let paise = ((rounded - rounded.trunc()) * Decimal::from(100))
        .round()
        .to_u64()
        .unwrap_or(0);

    if taka == 0 && paise == 0 {
        return "Zero Taka Only".to_string();
    }

    let mut out = if taka > 0 {
        format!("{} Taka", integer_words(taka))
    } else {
        "Zero Taka".to_string()
    };

    if paise > 0 {
        out.push_str(&format!(" and {} Paise", two_digits(paise)));
    }

    out.push_str(" Only");
    out
}

fn integer_words(n: u64) -> String {
    if n == 0 {
        return "Zero".to_string();
    }

    let mut parts: Vec<String> = Vec::new();

    // Recursion covers amounts of one hundred crore (10^9) and beyond.
    let crore = n / 10_000_000;
    if crore > 0 {
        parts.push(format!("{} Crore", integer_words(crore)));
    }

    let lakh = (n / 100_000) % 100;
    if lakh > 0 {
        parts.push(format!("{} Lakh", two_digits(lakh)));
    }

    let thousand = (n / 1_000) % 100;
    if thousand > 0 {
        parts.push(format!("{} Thousand", two_digits(thousand)));
    }

    let hundred = (n / 100) % 10;
    if hundred > 0 {
        parts.push(format!("{} Hundred", ONES[hundred as usize]));
    }

    let last = n % 100;
    if last > 0 {
        parts.push(two_digits(last));
    }

    parts.join(" ")
}

fn two_digits(n: u64) -> String {
    if n < 20 {
        ONES[n as usize].to_string()
    } else if n % 10 == 0 {
        TENS[(n / 10) as usize].to_string()
    } else {
        format!("{} {}", TENS[(n / 10) as usize], ONES[(n % 10) as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_zero_is_special_cased() {
        assert_eq!(number_to_words(Decimal::ZERO), "Zero Taka Only");
    }

    #[test]
    fn test_one_lakh() {
        assert_eq!(number_to_words(dec("100000")), "One Lakh Taka Only");
    }

    #[test]
    fn test_lakh_crore_grouping() {
        assert_eq!(
            number_to_words(dec("1234567")),
            "Twelve Lakh Thirty Four Thousand Five Hundred Sixty Seven Taka Only"
        );
    }

    #[test]
    fn test_one_hundred_crore() {
        assert_eq!(
            number_to_words(dec("1000000000")),
            "One Hundred Crore Taka Only"
        );
    }

    #[test]
    fn test_paise_phrase() {
        let words = number_to_words(dec("1000.50"));
        assert_eq!(words, "One Thousand Taka and Fifty Paise Only");
    }

    #[test]
    fn test_paise_only_amount() {
        assert_eq!(number_to_words(dec("0.25")), "Zero Taka and Twenty Five Paise Only");
    }

    #[test]
    fn test_currency_formatting() {
        assert_eq!(format_currency(dec("1234567.891")), "Tk 1,234,567.89");
        assert_eq!(format_currency(dec("0")), "Tk 0.00");
        assert_eq!(format_currency(dec("999.995")), "Tk 1,000.00");
    }

    #[test]
    fn test_currency_negative() {
        assert_eq!(format_currency(dec("-1500")), "-Tk 1,500.00");
    }
}
