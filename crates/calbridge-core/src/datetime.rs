//! Timestamp codecs.
//!
//! Two formats are in play and they are kept deliberately separate:
//!
//! - the canonical record format `YYYY-MM-DDTHH:mm:ss.SSSZ`, always UTC, used for
//!   event start/end, recurrence end bounds and instance markers;
//! - the compact wire format `YYYYMMDD'T'HHmmss'Z'`, used only inside the `UNTIL`
//!   segment of a recurrence string. It carries no sub-second component.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DateTimeError;

const CANONICAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";
const COMPACT_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// `0000-01-01T00:00:00.000Z`
pub const MIN_CANONICAL_MILLIS: i64 = -62_167_219_200_000;
/// `9999-12-31T23:59:59.999Z`
pub const MAX_CANONICAL_MILLIS: i64 = 253_402_300_799_999;

/// Parse a canonical date string into epoch milliseconds.
pub fn parse(s: &str) -> Result<i64, DateTimeError> {
    parse_datetime(s).map(|dt| dt.timestamp_millis())
}

/// Parse a canonical date string into a UTC datetime.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DateTimeError> {
    if !has_canonical_shape(s) {
        return Err(DateTimeError::Malformed(s.to_string()));
    }
    NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| DateTimeError::Malformed(s.to_string()))
}

/// Render epoch milliseconds in the canonical format.
pub fn format(millis: i64) -> Result<String, DateTimeError> {
    if !(MIN_CANONICAL_MILLIS..=MAX_CANONICAL_MILLIS).contains(&millis) {
        return Err(DateTimeError::OutOfRange(millis));
    }
    DateTime::from_timestamp_millis(millis)
        .map(format_datetime)
        .ok_or(DateTimeError::OutOfRange(millis))
}

/// Render a UTC datetime in the canonical format.
pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format(CANONICAL_FORMAT).to_string()
}

/// Parse a compact wire date (`20250601T000000Z`).
pub fn parse_compact(s: &str) -> Result<DateTime<Utc>, DateTimeError> {
    if !has_compact_shape(s) {
        return Err(DateTimeError::Malformed(s.to_string()));
    }
    NaiveDateTime::parse_from_str(s, COMPACT_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| DateTimeError::Malformed(s.to_string()))
}

/// Render a compact wire date. Sub-second precision is dropped.
pub fn format_compact(dt: DateTime<Utc>) -> String {
    dt.format(COMPACT_FORMAT).to_string()
}

/// Absent or unrenderable timestamps become `None`.
pub fn millis_to_string(millis: Option<i64>) -> Option<String> {
    let millis = millis?;
    match format(millis) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::debug!(millis, error = %e, "dropping unrenderable timestamp");
            None
        }
    }
}

/// Absent or unparseable strings become `None`.
pub fn string_to_millis(value: Option<&str>) -> Option<i64> {
    let value = value?;
    match parse(value) {
        Ok(millis) => Some(millis),
        Err(e) => {
            tracing::debug!(value, error = %e, "dropping unparseable date");
            None
        }
    }
}

/// Render a whole-second duration as `PT<n>S`.
pub fn format_duration_seconds(secs: i64) -> String {
    format!("PT{}S", secs)
}

/// Parse a `PT<n>S` duration into seconds.
pub fn parse_duration_seconds(duration: &str) -> Option<i64> {
    duration
        .strip_prefix("PT")?
        .strip_suffix('S')?
        .parse()
        .ok()
}

// Seconds stop at 59; chrono would otherwise read `60` as a leap second.
fn has_canonical_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 24
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            10 => *b == b'T',
            13 | 16 => *b == b':',
            17 => (b'0'..=b'5').contains(b),
            19 => *b == b'.',
            23 => *b == b'Z',
            _ => b.is_ascii_digit(),
        })
}

fn has_compact_shape(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() == 16
        && bytes.iter().enumerate().all(|(i, b)| match i {
            8 => *b == b'T',
            13 => (b'0'..=b'5').contains(b),
            15 => *b == b'Z',
            _ => b.is_ascii_digit(),
        })
}

/// A date as it arrives from the bridge: either a canonical string or a raw
/// epoch-milliseconds number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    Millis(i64),
    Text(String),
}

impl DateInput {
    /// Resolve to epoch milliseconds.
    pub fn to_millis(&self) -> Result<i64, DateTimeError> {
        match self {
            DateInput::Millis(millis) => Ok(*millis),
            DateInput::Text(s) => parse(s),
        }
    }
}

impl From<i64> for DateInput {
    fn from(millis: i64) -> Self {
        DateInput::Millis(millis)
    }
}

impl From<&str> for DateInput {
    fn from(s: &str) -> Self {
        DateInput::Text(s.to_string())
    }
}

impl From<String> for DateInput {
    fn from(s: String) -> Self {
        DateInput::Text(s)
    }
}
