//! Whole-unit currency amounts.
//!
//! The store sells in a single currency without minor units, so amounts are
//! plain [`Decimal`] values rounded to whole units wherever they are charged
//! or displayed.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round an amount to a whole currency unit, halves away from zero.
#[must_use]
pub fn round_to_unit(amount: Decimal) -> Decimal {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Format an amount with `.` as the thousands separator and no decimals.
///
/// ```rust
/// # use rust_decimal::Decimal;
/// # use toko_core::format_amount;
/// assert_eq!(format_amount(Decimal::new(1_476_000, 0)), "1.476.000");
/// ```
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded = round_to_unit(amount);
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        grouped.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    grouped
}

/// Format an amount for display with the currency prefix, e.g. `Rp 160.000`.
#[must_use]
pub fn display_amount(amount: Decimal) -> String {
    format!("Rp {}", format_amount(amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_to_unit(Decimal::new(175, 1)), Decimal::from(18));
        assert_eq!(round_to_unit(Decimal::new(174, 1)), Decimal::from(17));
        assert_eq!(round_to_unit(Decimal::new(-175, 1)), Decimal::from(-18));
    }

    #[test]
    fn groups_thousands_with_dots() {
        assert_eq!(format_amount(Decimal::ZERO), "0");
        assert_eq!(format_amount(Decimal::from(999)), "999");
        assert_eq!(format_amount(Decimal::from(1000)), "1.000");
        assert_eq!(format_amount(Decimal::from(160_000)), "160.000");
        assert_eq!(format_amount(Decimal::from(12_345_678)), "12.345.678");
    }

    #[test]
    fn formats_scaled_and_negative_amounts() {
        assert_eq!(format_amount(Decimal::new(16_000_000, 2)), "160.000");
        assert_eq!(format_amount(Decimal::from(-40_000)), "-40.000");
    }

    #[test]
    fn display_adds_currency_prefix() {
        assert_eq!(display_amount(Decimal::from(147_600)), "Rp 147.600");
    }
}
