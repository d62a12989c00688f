//! Boundary coercion for numeric input.
//!
//! Every number that enters the core (form text, JSON payloads, floats coming
//! from a UI binding) passes through here first. Missing or non-numeric values
//! become zero, so no later computation ever sees an invalid number.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Parses free-form numeric text. Accepts `.` or `,` as decimal separator,
/// the other one as thousands separator (`1.234,56`, `1,234.56`) and
/// scientific notation; anything else is zero.
pub fn coerce_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    if let Ok(value) = Decimal::from_str(trimmed) {
        return value;
    }

    let normalized = normalize_separators(trimmed);
    Decimal::from_str(&normalized)
        .or_else(|_| Decimal::from_scientific(&normalized))
        .unwrap_or(Decimal::ZERO)
}

/// The last separator is the decimal one when both appear; a separator that
/// repeats on its own only groups thousands.
fn normalize_separators(text: &str) -> String {
    let last_dot = text.rfind('.');
    let last_comma = text.rfind(',');
    match (last_dot, last_comma) {
        (Some(dot), Some(comma)) if comma > dot => text.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => text.replace(',', ""),
        (None, Some(_)) if text.matches(',').count() > 1 => text.replace(',', ""),
        (None, Some(_)) => text.replace(',', "."),
        (Some(_), None) if text.matches('.').count() > 1 => text.replace('.', ""),
        _ => text.to_string(),
    }
}

/// NaN and infinities map to zero.
pub fn amount_from_f64(value: f64) -> Decimal {
    if !value.is_finite() {
        return Decimal::ZERO;
    }
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO)
}

pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Whole non-negative count from free-form text (`"001"` -> 1, `"abc"` -> 0).
pub fn coerce_count(raw: &str) -> u64 {
    let value = coerce_amount(raw).trunc();
    if value.is_sign_negative() {
        return 0;
    }
    u64::from_str(&value.to_string()).unwrap_or(0)
}

/// Parses a calendar date from `YYYY-MM-DD`, an RFC 3339 timestamp, a naive
/// `YYYY-MM-DDTHH:MM:SS` timestamp or `dd/mm/yyyy`.
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(trimmed).ok().map(|value| value.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|value| value.date())
        })
        .or_else(|| NaiveDate::parse_from_str(trimmed, "%d/%m/%Y").ok())
}

fn decimal_from_value(value: Option<Value>) -> Decimal {
    match value {
        Some(Value::Number(number)) => coerce_amount(&number.to_string()),
        Some(Value::String(text)) => coerce_amount(&text),
        _ => Decimal::ZERO,
    }
}

/// Serde adapter: numbers, numeric strings, `null` and garbage all produce a
/// `Decimal`, never an error.
pub fn lenient_decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(decimal_from_value(value))
}

pub fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(number)) => {
            number.as_u64().unwrap_or_else(|| coerce_count(&number.to_string()))
        }
        Some(Value::String(text)) => coerce_count(&text),
        _ => 0,
    })
}

pub fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = lenient_u64(deserializer)?;
    Ok(u32::try_from(value).unwrap_or(u32::MAX))
}

/// Dates must parse; an unusable date is a shape error rather than a silent
/// default, so an import never rewrites the issue date to an arbitrary value.
pub fn lenient_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized date `{raw}`")))
}
