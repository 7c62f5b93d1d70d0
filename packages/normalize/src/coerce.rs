//! Tolerant value coercion.
//!
//! Raw CSV values are loosely typed. Coercion never fails: missing,
//! non-numeric, negative or non-finite input degrades to an empty string
//! or zero.

use serde_json::Value;

/// Converts a raw value to trimmed text.
///
/// Integral numbers render without a fractional part (`2020`, not
/// `2020.0`). Booleans, arrays and objects render as an empty string.
#[must_use]
pub fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => format_number(n),
        _ => String::new(),
    }
}

/// Converts a raw value to a non-negative finite number, or `0.0`.
///
/// Strings are trimmed and may contain `,` thousands separators.
#[must_use]
pub fn coerce_number(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => parse_loose(s),
        _ => None,
    };

    parsed.filter(|v| v.is_finite() && *v >= 0.0).unwrap_or(0.0)
}

/// Converts a raw value to a whole, non-negative count.
///
/// Fractional counts are truncated.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coerce_count(value: Option<&Value>) -> u64 {
    coerce_number(value).trunc() as u64
}

fn parse_loose(s: &str) -> Option<f64> {
    let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[allow(clippy::cast_possible_truncation)]
fn format_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => String::new(),
    }
}
