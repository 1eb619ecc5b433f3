//! Price formatting helpers.
//!
//! Prices are stored and computed as [`rust_decimal::Decimal`] throughout;
//! this module only concerns itself with display.

use rust_decimal::Decimal;

/// Format a decimal amount as a Euro price string, e.g. `12.50 €`.
///
/// Always renders two decimal places.
#[must_use]
pub fn format_eur(amount: Decimal) -> String {
    format!("{:.2} €", amount.round_dp(2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_format_eur_two_decimals() {
        assert_eq!(format_eur(Decimal::new(1250, 2)), "12.50 €");
        assert_eq!(format_eur(Decimal::new(5, 0)), "5.00 €");
    }

    #[test]
    fn test_format_eur_rounds() {
        // 9.999 rounds to 10.00 (banker's rounding does not apply at .5 here)
        assert_eq!(format_eur(Decimal::new(9999, 3)), "10.00 €");
    }
}
