// --- File: crates/trackpro_stripe/src/currency.rs ---
//! Conversion from major currency units (what the app displays) to the minor units
//! Stripe expects.

/// Currencies Stripe charges in whole units.
const ZERO_DECIMAL: &[&str] = &[
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

/// Currencies with three decimal places.
const THREE_DECIMAL: &[&str] = &["bhd", "jod", "kwd", "omr", "tnd"];

/// Number of minor units per major unit for `currency` (case-insensitive).
pub fn minor_unit_factor(currency: &str) -> i64 {
    let currency = currency.to_ascii_lowercase();
    if ZERO_DECIMAL.contains(&currency.as_str()) {
        1
    } else if THREE_DECIMAL.contains(&currency.as_str()) {
        1000
    } else {
        100
    }
}

/// Converts a major-unit amount to minor units, rounding to the nearest unit.
///
/// Returns `None` for negative, non-finite or out-of-range amounts.
pub fn to_minor_units(amount: f64, currency: &str) -> Option<i64> {
    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    let minor = (amount * minor_unit_factor(currency) as f64).round();
    // i64::MAX is not exactly representable; stay well inside it
    if minor >= 9.0e18 {
        return None;
    }
    Some(minor as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_decimal_currency() {
        assert_eq!(to_minor_units(4.99, "USD"), Some(499));
        assert_eq!(to_minor_units(19.999, "eur"), Some(2000));
    }

    #[test]
    fn test_zero_decimal_currency() {
        assert_eq!(to_minor_units(500.0, "JPY"), Some(500));
        assert_eq!(to_minor_units(1200.0, "krw"), Some(1200));
    }

    #[test]
    fn test_three_decimal_currency() {
        assert_eq!(to_minor_units(1.5, "KWD"), Some(1500));
    }

    #[test]
    fn test_rejects_invalid_amounts() {
        assert_eq!(to_minor_units(-1.0, "usd"), None);
        assert_eq!(to_minor_units(f64::NAN, "usd"), None);
        assert_eq!(to_minor_units(f64::INFINITY, "usd"), None);
        assert_eq!(to_minor_units(1.0e20, "usd"), None);
    }
}
