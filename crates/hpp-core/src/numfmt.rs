//! Locale-aware numeric parsing and formatting (id-ID conventions).
//!
//! `.` groups thousands and `,` separates the fraction. The lenient entry
//! points never fail: malformed input degrades to zero or to an empty string,
//! which is what the form layer expects while the user is still typing.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Currency symbol used by [`format_currency_display`].
pub const CURRENCY_SYMBOL: &str = "Rp";

/// Errors from the strict numeric parser.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NumberError {
    /// Input was empty or whitespace only.
    #[error("empty numeric input")]
    Empty,
    /// Input does not start with a number.
    #[error("not a number: {0:?}")]
    NotANumber(String),
    /// Digits do not fit in a 96-bit decimal.
    #[error("numeric value out of range: {0:?}")]
    OutOfRange(String),
}

/// Parse a locale-formatted number, reporting why it failed.
///
/// Every `.` is a thousands separator and the first `,` starts the fraction.
/// Parsing stops at the first character that cannot continue the number, so
/// `"12.500 gram"` reads as `12500`.
pub fn parse_decimal_strict(text: &str) -> Result<Decimal, NumberError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(NumberError::Empty);
    }

    let mut negative = false;
    let mut body = trimmed;
    if let Some(rest) = body.strip_prefix('-') {
        negative = true;
        body = rest;
    } else if let Some(rest) = body.strip_prefix('+') {
        body = rest;
    }

    let mut digits = String::with_capacity(body.len());
    let mut seen_fraction = false;
    let mut seen_digit = false;
    for ch in body.chars() {
        match ch {
            '0'..='9' => {
                seen_digit = true;
                digits.push(ch);
            }
            '.' => {}
            ',' if !seen_fraction => {
                seen_fraction = true;
                if digits.is_empty() {
                    digits.push('0');
                }
                digits.push('.');
            }
            _ => break,
        }
    }
    if !seen_digit {
        return Err(NumberError::NotANumber(trimmed.to_string()));
    }
    if digits.ends_with('.') {
        digits.pop();
    }

    let value =
        Decimal::from_str(&digits).map_err(|_| NumberError::OutOfRange(trimmed.to_string()))?;
    Ok(if negative { -value } else { value })
}

/// Parse a locale-formatted number; anything unparsable becomes zero.
///
/// Example:
/// assert_eq!(parse_localized_number("1.200.000"), Decimal::new(1_200_000, 0));
pub fn parse_localized_number(text: &str) -> Decimal {
    match parse_decimal_strict(text) {
        Ok(value) => value,
        Err(NumberError::Empty) => Decimal::ZERO,
        Err(err) => {
            debug!(%err, "unparsable numeric input, using zero");
            Decimal::ZERO
        }
    }
}

/// Round to a whole number, half away from zero.
pub fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Format a value as a dot-grouped whole number for input fields.
///
/// Zero formats to the empty string, so a cleared field and a zero amount
/// look the same.
pub fn format_localized_integer(value: Decimal) -> String {
    let rounded = round_whole(value);
    if rounded.is_zero() {
        return String::new();
    }
    let grouped = group_thousands(&rounded.abs().trunc().to_string());
    if rounded.is_sign_negative() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Format a value for display with up to `max_fraction_digits` decimals,
/// trailing zeros trimmed (`17,8`, `1.234`, `0`).
pub fn format_localized_decimal(value: Decimal, max_fraction_digits: u32) -> String {
    let rounded = value
        .round_dp_with_strategy(max_fraction_digits, RoundingStrategy::MidpointAwayFromZero)
        .normalize();
    let text = rounded.abs().to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (text.as_str(), None),
    };
    let mut out = String::with_capacity(text.len() + 4);
    if rounded.is_sign_negative() && !rounded.is_zero() {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if let Some(frac) = frac_part {
        out.push(',');
        out.push_str(frac);
    }
    out
}

/// Format a money amount as whole rupiah, e.g. `Rp 12.500` or `-Rp 3.000.000`.
pub fn format_currency_display(value: Decimal) -> String {
    let rounded = round_whole(value);
    if rounded.is_zero() {
        return format!("{CURRENCY_SYMBOL} 0");
    }
    let grouped = group_thousands(&rounded.abs().trunc().to_string());
    if rounded.is_sign_negative() {
        format!("-{CURRENCY_SYMBOL} {grouped}")
    } else {
        format!("{CURRENCY_SYMBOL} {grouped}")
    }
}

/// Serde adapter for amounts that arrive either as numbers or as
/// locale-formatted strings. Empty strings and `null` read as `None`.
///
/// Use with `#[serde(default, with = "hpp_core::numfmt::amount")]`.
pub mod amount {
    use super::*;
    use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;

    struct AmountVisitor;

    impl<'de> Visitor<'de> for AmountVisitor {
        type Value = Option<Decimal>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a number or a locale-formatted numeric string")
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(Decimal::from(v)))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(Decimal::from(v)))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(Decimal::from_f64(v).unwrap_or(Decimal::ZERO)))
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            if v.trim().is_empty() {
                return Ok(None);
            }
            Ok(Some(parse_localized_number(v)))
        }

        fn visit_bool<E: de::Error>(self, _v: bool) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
            d.deserialize_any(AmountVisitor)
        }
    }

    fn write<S: Serializer>(value: Decimal, s: S) -> Result<S::Ok, S::Error> {
        if value.fract().is_zero() {
            if let Some(whole) = value.to_i64() {
                return s.serialize_i64(whole);
            }
        }
        s.serialize_f64(value.to_f64().unwrap_or(0.0))
    }

    pub fn serialize<S: Serializer>(value: &Option<Decimal>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => write(*v, s),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Decimal>, D::Error> {
        d.deserialize_any(AmountVisitor)
    }

    /// Same as the parent module, but a missing value reads as zero.
    pub mod or_zero {
        use super::*;

        pub fn serialize<S: Serializer>(value: &Decimal, s: S) -> Result<S::Ok, S::Error> {
            write(*value, s)
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Decimal, D::Error> {
            Ok(super::deserialize(d)?.unwrap_or(Decimal::ZERO))
        }
    }
}
