//! Lenient decimal coercion
//!
//! User input and imported files carry amounts as free text or JSON numbers.
//! Anything unparseable coerces to zero instead of failing.

use std::str::FromStr;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;

/// Coerce free text to a decimal, defaulting to zero
///
/// Accepts plain decimals ("12.50"), scientific notation ("1e3"), and a
/// leading numeric prefix followed by junk ("42 EUR" -> 42).
pub fn coerce_decimal(input: &str) -> Decimal {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    if let Ok(value) = Decimal::from_str(trimmed) {
        return value;
    }
    if let Ok(value) = Decimal::from_scientific(trimmed) {
        return value;
    }

    let prefix = numeric_prefix(trimmed);
    Decimal::from_str(prefix).unwrap_or(Decimal::ZERO)
}

/// Coerce a JSON value (number, numeric string, or anything else) to a decimal
pub fn coerce_json_decimal(value: Option<&JsonValue>) -> Decimal {
    match value {
        Some(JsonValue::Number(n)) => {
            if let Some(i) = n.as_i64() {
                Decimal::from(i)
            } else {
                // Go through the textual form so 0.1 stays 0.1
                Decimal::from_str(&n.to_string())
                    .ok()
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64))
                    .unwrap_or(Decimal::ZERO)
            }
        }
        Some(JsonValue::String(s)) => coerce_decimal(s),
        _ => Decimal::ZERO,
    }
}

/// Longest prefix that looks like a signed decimal number
fn numeric_prefix(s: &str) -> &str {
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in s.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if seen_digit {
        s[..end].trim_end_matches('.')
    } else {
        ""
    }
}
