use anyhow::{Context, Result};
use calbridge_core::datetime;
use chrono::{DateTime, Utc};
use chrono_english::{parse_date_string, Dialect};

/// Accepts a canonical date, a compact `UNTIL` date, epoch milliseconds, or a
/// natural-language phrase relative to now.
pub fn parse_date_arg(input: &str) -> Result<DateTime<Utc>> {
    parse_date_arg_at(input, Utc::now())
}

pub fn parse_date_arg_at(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(dt) = datetime::parse_datetime(input) {
        return Ok(dt);
    }
    if let Ok(dt) = datetime::parse_compact(input) {
        return Ok(dt);
    }
    if let Ok(millis) = input.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis)
            .with_context(|| format!("Timestamp {} is out of range", millis));
    }
    tracing::debug!(input, "falling back to natural-language date parsing");
    parse_date_string(input, now, Dialect::Us)
        .map_err(|e| anyhow::anyhow!("Failed to parse date '{}': {}", input, e))
}
