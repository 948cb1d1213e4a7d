//! Monetary amounts.
//!
//! The store prices in whole pesos but the backends send decimals, so all
//! arithmetic is done in [`rust_decimal::Decimal`] rather than floats.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Amount of money in the store currency.
pub type Money = Decimal;

/// Format an amount for display, e.g. `$145.000` or `$12.345,50`.
///
/// Uses the store locale: `.` as the thousands separator, `,` before the
/// cents, and cents omitted when the amount is whole.
#[must_use]
pub fn format_money(amount: Money) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();

    let whole = abs.trunc();
    let cents = ((abs - whole) * Decimal::ONE_HUNDRED)
        .trunc()
        .to_u32()
        .unwrap_or(0);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if negative { "-" } else { "" };
    if cents == 0 {
        format!("{sign}${grouped}")
    } else {
        format!("{sign}${grouped},{cents:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_whole_amounts() {
        assert_eq!(format_money(Decimal::new(145_000, 0)), "$145.000");
        assert_eq!(format_money(Decimal::new(5_000, 0)), "$5.000");
        assert_eq!(format_money(Decimal::new(999, 0)), "$999");
        assert_eq!(format_money(Decimal::ZERO), "$0");
    }

    #[test]
    fn test_format_with_cents() {
        assert_eq!(format_money(Decimal::new(1_234_550, 2)), "$12.345,50");
        assert_eq!(format_money(Decimal::new(105, 2)), "$1,05");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(format_money(Decimal::new(-2_500, 0)), "-$2.500");
    }
}
