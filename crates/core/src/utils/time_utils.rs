//! Date normalization for provider payloads.
//!
//! Providers hand us dates as canonical strings, ISO timestamps with offsets,
//! Brazilian `dd/mm/yyyy` strings or epoch milliseconds. Everything funnels
//! into a `NaiveDate`; anything we cannot read becomes `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use num_traits::ToPrimitive;
use serde_json::Value;

/// Canonical wire format for calendar dates.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d";

const NAIVE_DATETIME_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

const NAIVE_DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%d/%m/%Y"];

/// True when `input` already has the exact `YYYY-MM-DD` shape.
pub fn is_canonical_date(input: &str) -> bool {
    let bytes = input.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Parses a textual date.
///
/// Canonical strings are read as-is, without any timezone handling, so a
/// canonical date always normalizes to itself. Timestamps carrying an offset
/// are converted to UTC before the date is taken; timestamps without one are
/// treated as UTC.
pub fn normalize_date_str(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if is_canonical_date(trimmed) {
        return NaiveDate::parse_from_str(trimmed, CANONICAL_DATE_FORMAT).ok();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(trimmed) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.date());
        }
    }
    for format in NAIVE_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Some(date);
        }
    }

    None
}

/// Parses an arbitrary JSON value into a calendar date.
///
/// Numbers are epoch milliseconds. Null, booleans, containers and
/// unparseable strings yield `None`.
pub fn normalize_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::String(s) => normalize_date_str(s),
        Value::Number(n) => {
            // Fractional or out-of-range millis: truncate, or give up.
            let millis = match n.as_i64() {
                Some(ms) => ms,
                None => n.as_f64()?.trunc().to_i64()?,
            };
            DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.date_naive())
        }
        _ => None,
    }
}

/// Renders a date in the canonical `YYYY-MM-DD` form.
pub fn to_canonical(date: NaiveDate) -> String {
    date.format(CANONICAL_DATE_FORMAT).to_string()
}

/// Normalizes a textual date and renders it canonically.
pub fn canonicalize_date_str(input: &str) -> Option<String> {
    normalize_date_str(input).map(to_canonical)
}

/// Whole days from `start` to `end` (negative when `end` is earlier).
pub fn days_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days()
}
