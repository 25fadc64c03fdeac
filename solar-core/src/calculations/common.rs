//! Common utility functions for solar calculations.
//!
//! This module provides rounding and the locale-aware display helpers used by
//! every report surface. Numbers are rendered the Brazilian way: `.` groups
//! thousands, `,` separates decimals, and money is prefixed with `R$`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Fraction digits used when no explicit count is requested.
pub const DEFAULT_DECIMALS: u32 = 2;

/// Currency symbol for Brazilian reais.
pub const CURRENCY_SYMBOL: &str = "R$";

const THOUSANDS_SEPARATOR: char = '.';
const DECIMAL_SEPARATOR: char = ',';
const NO_BREAK_SPACE: char = '\u{a0}';

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// This follows standard financial rounding conventions where values at exactly
/// 0.005 are rounded up to 0.01 (away from zero).
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use solar_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.454)), dec!(123.45));
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DEFAULT_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats `value` with exactly `decimals` fraction digits and pt-BR grouping.
///
/// Rounding is half away from zero, applied to the shortest decimal
/// representation of the float (so `2.675` becomes `2,68`). Non-finite values
/// are rendered as `NaN`, `∞` or `-∞` rather than rejected.
///
/// # Examples
///
/// ```
/// use solar_core::calculations::common::format_number;
///
/// assert_eq!(format_number(1234.5, 2), "1.234,50");
/// assert_eq!(format_number(-0.125, 2), "-0,13");
/// assert_eq!(format_number(309.375, 0), "309");
/// ```
pub fn format_number(
    value: f64,
    decimals: u32,
) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let plain = match value.to_string().parse::<Decimal>() {
        Ok(decimal) => {
            let mut rounded =
                decimal.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero);
            if rounded.is_zero() {
                rounded.set_sign_positive(true);
            }
            rounded.rescale(decimals);
            rounded.to_string()
        }
        // Outside Decimal's range or precision; f64 formatting is close enough.
        Err(_) => format!("{:.*}", decimals as usize, value),
    };

    localize(&plain)
}

/// [`format_number`] with the default of two fraction digits.
pub fn format_number_2(value: f64) -> String {
    format_number(value, DEFAULT_DECIMALS)
}

/// Formats `value` as Brazilian reais, e.g. `R$ 1.234,56`.
///
/// The symbol is separated by a non-breaking space and negative amounts put
/// the sign before the symbol (`-R$ 10,00`).
///
/// # Examples
///
/// ```
/// use solar_core::calculations::common::format_currency;
///
/// assert_eq!(format_currency(18000.0), "R$\u{a0}18.000,00");
/// assert_eq!(format_currency(-2.5), "-R$\u{a0}2,50");
/// ```
pub fn format_currency(value: f64) -> String {
    let number = format_number(value, DEFAULT_DECIMALS);
    match number.strip_prefix('-') {
        Some(magnitude) => format!("-{CURRENCY_SYMBOL}{NO_BREAK_SPACE}{magnitude}"),
        None => format!("{CURRENCY_SYMBOL}{NO_BREAK_SPACE}{number}"),
    }
}

/// Zero and `NaN` count as "not provided" for numeric inputs.
pub(crate) fn is_falsy(value: f64) -> bool {
    value == 0.0 || value.is_nan()
}

/// `NaN` becomes zero; everything else passes through.
pub(crate) fn or_zero(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value }
}

/// Rewrites a plain `-1234.56` string with pt-BR separators.
fn localize(plain: &str) -> String {
    let (sign, digits) = match plain.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", plain),
    };
    let (integer, fraction) = match digits.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (digits, None),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(THOUSANDS_SEPARATOR);
        }
        grouped.push(digit);
    }

    match fraction {
        Some(fraction) => format!("{sign}{grouped}{DECIMAL_SEPARATOR}{fraction}"),
        None => format!("{sign}{grouped}"),
    }
}
