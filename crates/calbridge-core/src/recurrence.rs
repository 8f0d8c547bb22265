//! Recurrence-rule codec.
//!
//! A recurring event series is persisted as a single wire string of
//! semicolon-delimited `KEY=VALUE` segments:
//!
//! ```text
//! FREQ=WEEKLY;INTERVAL=2;UNTIL=20250601T000000Z
//! FREQ=DAILY;COUNT=10
//! ```
//!
//! Only `FREQ`, `INTERVAL`, `UNTIL` and `COUNT` are understood. Decoding is
//! forgiving: unknown keys are ignored, a bad `FREQ` leaves the frequency unset
//! and a bad `UNTIL` is carried through verbatim. Encoding is strict and rejects
//! rules a store could not persist.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

use crate::datetime;
use crate::error::CoreError;

/// Upper bound on occurrences produced by a single expansion.
pub const MAX_EXPANSION: u16 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    /// Token used in the `FREQ` segment.
    pub fn wire_token(&self) -> &'static str {
        match self {
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Yearly => "YEARLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Yearly => write!(f, "yearly"),
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence frequency: {0}")]
pub struct ParseFrequencyError(String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

/// How a series ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurrenceBound {
    Date(String),
    Count(u32),
    Unbounded,
}

/// Structured recurrence description.
///
/// `frequency` is only `None` for a rule decoded from a wire string with an
/// unrecognized `FREQ` token; such a rule cannot be encoded again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecurrenceRule {
    pub frequency: Option<Frequency>,
    /// Left unset when absent on the wire; see [`RecurrenceRule::effective_interval`].
    pub interval: Option<u32>,
    /// Canonical date string, or the raw `UNTIL` value when it could not be parsed.
    pub end_date: Option<String>,
    pub occurrence_count: Option<u32>,
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency: Some(frequency),
            ..Default::default()
        }
    }

    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Bound the series by a canonical end date.
    pub fn until(mut self, end_date: impl Into<String>) -> Self {
        self.end_date = Some(end_date.into());
        self
    }

    /// Bound the series by a number of occurrences.
    pub fn count(mut self, occurrences: u32) -> Self {
        self.occurrence_count = Some(occurrences);
        self
    }

    #[inline]
    pub fn effective_interval(&self) -> u32 {
        self.interval.unwrap_or(1)
    }

    /// An end date takes precedence over a count when both are present.
    pub fn bound(&self) -> RecurrenceBound {
        match (&self.end_date, self.occurrence_count) {
            (Some(end), _) => RecurrenceBound::Date(end.clone()),
            (None, Some(count)) => RecurrenceBound::Count(count),
            (None, None) => RecurrenceBound::Unbounded,
        }
    }

    #[inline]
    pub fn is_unbounded(&self) -> bool {
        self.bound() == RecurrenceBound::Unbounded
    }

    /// Expand the series starting at `dtstart`, returning at most `limit`
    /// occurrences (capped at [`MAX_EXPANSION`]).
    pub fn occurrences(
        &self,
        dtstart: DateTime<Utc>,
        limit: u16,
    ) -> Result<Vec<DateTime<Utc>>, CoreError> {
        let wire = encode(self)?;
        let rrule_string = format!(
            "DTSTART:{}\nRRULE:{}",
            datetime::format_compact(dtstart),
            wire
        );

        let rrule_set = rrule_string
            .parse::<RRuleSet>()
            .map_err(|e| CoreError::Recurrence(format!("Failed to parse RRULE '{}': {}", wire, e)))?;

        let result = rrule_set.all(limit.min(MAX_EXPANSION));
        Ok(result.dates.iter().map(|dt| dt.with_timezone(&Utc)).collect())
    }

    /// Expand occurrences falling inside `[start, end]`, both ends inclusive.
    pub fn occurrences_between(
        &self,
        dtstart: DateTime<Utc>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DateTime<Utc>>, CoreError> {
        let wire = encode(self)?;
        let rrule_string = format!(
            "DTSTART:{}\nRRULE:{}",
            datetime::format_compact(dtstart),
            wire
        );

        let rrule_set = rrule_string
            .parse::<RRuleSet>()
            .map_err(|e| CoreError::Recurrence(format!("Failed to parse RRULE '{}': {}", wire, e)))?;

        // after/before are exclusive
        let tz: rrule::Tz = Utc.into();
        let after = start
            .checked_sub_signed(Duration::seconds(1))
            .unwrap_or(start)
            .with_timezone(&tz);
        let before = end
            .checked_add_signed(Duration::seconds(1))
            .unwrap_or(end)
            .with_timezone(&tz);

        let result = rrule_set.after(after).before(before).all(MAX_EXPANSION);
        Ok(result.dates.iter().map(|dt| dt.with_timezone(&Utc)).collect())
    }
}

/// Decode a persisted wire string. `None` means the event does not recur.
pub fn decode(wire: Option<&str>) -> Option<RecurrenceRule> {
    let wire = wire?;
    if wire.trim().is_empty() {
        return None;
    }

    // Values stay untrimmed so a lossy UNTIL is carried verbatim.
    let segments: HashMap<String, &str> = wire
        .split(';')
        .filter_map(|segment| segment.split_once('='))
        .map(|(key, value)| (key.trim().to_uppercase(), value))
        .collect();

    let frequency = segments.get("FREQ").and_then(|token| match token.parse::<Frequency>() {
        Ok(frequency) => Some(frequency),
        Err(_) => {
            tracing::warn!(token, "unrecognized recurrence frequency, leaving unset");
            None
        }
    });

    let interval = segments.get("INTERVAL").and_then(|value| parse_positive(value));

    let end_date = segments.get("UNTIL").map(|until| match datetime::parse_compact(until.trim()) {
        Ok(dt) => datetime::format_datetime(dt),
        Err(e) => {
            tracing::warn!(until, error = %e, "could not parse UNTIL, keeping raw value");
            until.to_string()
        }
    });

    let occurrence_count = segments.get("COUNT").and_then(|value| parse_positive(value));

    Some(RecurrenceRule {
        frequency,
        interval,
        end_date,
        occurrence_count,
    })
}

/// Encode a rule into its canonical wire string.
pub fn encode(rule: &RecurrenceRule) -> Result<String, CoreError> {
    let frequency = rule.frequency.ok_or(CoreError::MissingFrequency)?;
    let mut segments = vec![format!("FREQ={}", frequency.wire_token())];

    match rule.interval {
        Some(0) => return Err(CoreError::InvalidInterval(0)),
        Some(interval) if interval != 1 => segments.push(format!("INTERVAL={}", interval)),
        _ => {}
    }

    match rule.bound() {
        RecurrenceBound::Date(end_date) => {
            segments.push(format!("UNTIL={}", until_token(&end_date)?));
        }
        RecurrenceBound::Count(0) => return Err(CoreError::InvalidCount(0)),
        RecurrenceBound::Count(count) => segments.push(format!("COUNT={}", count)),
        RecurrenceBound::Unbounded => {}
    }

    Ok(segments.join(";"))
}

fn until_token(end_date: &str) -> Result<String, CoreError> {
    if let Ok(dt) = datetime::parse_datetime(end_date) {
        return Ok(datetime::format_compact(dt));
    }
    // Already in wire form, e.g. a raw value carried through decode.
    if datetime::parse_compact(end_date).is_ok() {
        return Ok(end_date.to_string());
    }
    Err(CoreError::InvalidDate(format!(
        "recurrence end date '{}' is not a canonical date",
        end_date
    )))
}

fn parse_positive(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

/// Bridge-facing shape of a recurrence rule.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRuleRecord {
    pub end_date: Option<String>,
    pub frequency: Option<String>,
    pub interval: Option<u32>,
    pub occurrence: Option<u32>,
}

impl From<RecurrenceRule> for RecurrenceRuleRecord {
    fn from(rule: RecurrenceRule) -> Self {
        Self {
            end_date: rule.end_date,
            frequency: rule.frequency.map(|f| f.to_string()),
            interval: rule.interval,
            occurrence: rule.occurrence_count,
        }
    }
}

impl TryFrom<&RecurrenceRuleRecord> for RecurrenceRule {
    type Error = CoreError;

    fn try_from(record: &RecurrenceRuleRecord) -> Result<Self, Self::Error> {
        let frequency = record
            .frequency
            .as_deref()
            .ok_or(CoreError::MissingFrequency)?
            .parse::<Frequency>()
            .map_err(|e| CoreError::InvalidInput(e.to_string()))?;

        Ok(RecurrenceRule {
            frequency: Some(frequency),
            interval: record.interval,
            end_date: record.end_date.clone(),
            occurrence_count: record.occurrence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    mod decode_tests {
        use super::*;

        #[test]
        fn test_absent_input_is_not_recurring() {
            assert_eq!(decode(None), None);
            assert_eq!(decode(Some("")), None);
            assert_eq!(decode(Some("   ")), None);
        }

        #[test]
        fn test_decode_count_bound() {
            let rule = decode(Some("FREQ=WEEKLY;INTERVAL=2;COUNT=5")).unwrap();
            assert_eq!(rule.frequency, Some(Frequency::Weekly));
            assert_eq!(rule.interval, Some(2));
            assert_eq!(rule.occurrence_count, Some(5));
            assert_eq!(rule.end_date, None);
        }

        #[test]
        fn test_decode_date_bound() {
            let rule = decode(Some("FREQ=DAILY;UNTIL=20250601T000000Z")).unwrap();
            assert_eq!(rule.frequency, Some(Frequency::Daily));
            assert_eq!(rule.interval, None);
            assert_eq!(rule.effective_interval(), 1);
            assert_eq!(rule.end_date.as_deref(), Some("2025-06-01T00:00:00.000Z"));
            assert_eq!(rule.occurrence_count, None);
        }

        #[test]
        fn test_decode_keeps_raw_until_on_failure() {
            let rule = decode(Some("FREQ=MONTHLY;UNTIL=garbage")).unwrap();
            assert_eq!(rule.frequency, Some(Frequency::Monthly));
            assert_eq!(rule.end_date.as_deref(), Some("garbage"));
        }

        #[test]
        fn test_decode_raw_until_keeps_whitespace() {
            let rule = decode(Some("FREQ=DAILY;UNTIL= garbage ")).unwrap();
            assert_eq!(rule.end_date.as_deref(), Some(" garbage "));

            let rule = decode(Some("FREQ=DAILY; UNTIL= 20250601T000000Z ;COUNT= 2 ")).unwrap();
            assert_eq!(rule.end_date.as_deref(), Some("2025-06-01T00:00:00.000Z"));
            assert_eq!(rule.occurrence_count, Some(2));
        }

        #[test]
        fn test_decode_unknown_frequency_is_unset() {
            let rule = decode(Some("FREQ=HOURLY;COUNT=3")).unwrap();
            assert_eq!(rule.frequency, None);
            assert_eq!(rule.occurrence_count, Some(3));
        }

        #[test]
        fn test_decode_tolerates_both_bounds() {
            let rule = decode(Some("FREQ=YEARLY;UNTIL=20300101T000000Z;COUNT=4")).unwrap();
            assert_eq!(rule.end_date.as_deref(), Some("2030-01-01T00:00:00.000Z"));
            assert_eq!(rule.occurrence_count, Some(4));
            assert_eq!(
                rule.bound(),
                RecurrenceBound::Date("2030-01-01T00:00:00.000Z".to_string())
            );
        }

        #[test]
        fn test_decode_is_case_insensitive_on_keys() {
            let rule = decode(Some("freq=weekly;Interval=3")).unwrap();
            assert_eq!(rule.frequency, Some(Frequency::Weekly));
            assert_eq!(rule.interval, Some(3));
        }

        #[test]
        fn test_decode_ignores_unknown_and_broken_segments() {
            let rule = decode(Some("FREQ=WEEKLY;BYDAY=MO,WE;WKST;X-CUSTOM=1")).unwrap();
            assert_eq!(rule, RecurrenceRule::new(Frequency::Weekly));
        }

        #[rstest]
        #[case("FREQ=DAILY;INTERVAL=abc")]
        #[case("FREQ=DAILY;INTERVAL=0")]
        #[case("FREQ=DAILY;INTERVAL=-2")]
        #[case("FREQ=DAILY;INTERVAL=")]
        fn test_decode_bad_interval_is_unset(#[case] wire: &str) {
            let rule = decode(Some(wire)).unwrap();
            assert_eq!(rule.interval, None);
            assert_eq!(rule.frequency, Some(Frequency::Daily));
        }

        #[rstest]
        #[case("FREQ=DAILY;COUNT=many")]
        #[case("FREQ=DAILY;COUNT=0")]
        fn test_decode_bad_count_is_unset(#[case] wire: &str) {
            assert_eq!(decode(Some(wire)).unwrap().occurrence_count, None);
        }

        #[test]
        fn test_decode_value_containing_equals() {
            // Only the first '=' separates key from value.
            let rule = decode(Some("FREQ=DAILY;UNTIL=2025=06")).unwrap();
            assert_eq!(rule.end_date.as_deref(), Some("2025=06"));
        }
    }

    mod encode_tests {
        use super::*;

        #[test]
        fn test_encode_frequency_only() {
            let rule = RecurrenceRule::new(Frequency::Daily);
            assert_eq!(encode(&rule).unwrap(), "FREQ=DAILY");
        }

        #[test]
        fn test_encode_omits_default_interval() {
            let rule = RecurrenceRule::new(Frequency::Weekly).with_interval(1);
            assert_eq!(encode(&rule).unwrap(), "FREQ=WEEKLY");
        }

        #[test]
        fn test_encode_stable_segment_order() {
            let rule = RecurrenceRule::new(Frequency::Monthly)
                .with_interval(3)
                .count(10);
            assert_eq!(encode(&rule).unwrap(), "FREQ=MONTHLY;INTERVAL=3;COUNT=10");

            let rule = RecurrenceRule::new(Frequency::Yearly)
                .with_interval(2)
                .until("2030-01-01T10:20:30.400Z");
            assert_eq!(
                encode(&rule).unwrap(),
                "FREQ=YEARLY;INTERVAL=2;UNTIL=20300101T102030Z"
            );
        }

        #[test]
        fn test_encode_prefers_until_over_count() {
            let rule = RecurrenceRule::new(Frequency::Daily)
                .until("2025-06-01T00:00:00.000Z")
                .count(7);
            assert_eq!(encode(&rule).unwrap(), "FREQ=DAILY;UNTIL=20250601T000000Z");
        }

        #[test]
        fn test_encode_accepts_compact_end_date() {
            let rule = RecurrenceRule::new(Frequency::Daily).until("20250601T000000Z");
            assert_eq!(encode(&rule).unwrap(), "FREQ=DAILY;UNTIL=20250601T000000Z");
        }

        #[test]
        fn test_encode_missing_frequency() {
            let rule = RecurrenceRule {
                interval: Some(1),
                occurrence_count: Some(3),
                ..Default::default()
            };
            assert!(matches!(encode(&rule), Err(CoreError::MissingFrequency)));
        }

        #[test]
        fn test_encode_rejects_zero_interval_and_count() {
            let rule = RecurrenceRule::new(Frequency::Daily).with_interval(0);
            assert!(matches!(encode(&rule), Err(CoreError::InvalidInterval(0))));

            let rule = RecurrenceRule::new(Frequency::Daily).count(0);
            assert!(matches!(encode(&rule), Err(CoreError::InvalidCount(0))));
        }

        #[test]
        fn test_encode_rejects_unparseable_end_date() {
            let rule = RecurrenceRule::new(Frequency::Daily).until("garbage");
            assert!(matches!(encode(&rule), Err(CoreError::InvalidDate(_))));
        }

        #[test]
        fn test_roundtrip_loses_only_subseconds() {
            let rule = RecurrenceRule::new(Frequency::Weekly)
                .with_interval(2)
                .until("2026-03-04T05:06:07.890Z");
            let decoded = decode(Some(&encode(&rule).unwrap())).unwrap();
            assert_eq!(decoded.frequency, rule.frequency);
            assert_eq!(decoded.interval, rule.interval);
            assert_eq!(decoded.end_date.as_deref(), Some("2026-03-04T05:06:07.000Z"));
        }
    }

    mod bound_tests {
        use super::*;

        #[test]
        fn test_bound_classification() {
            assert_eq!(
                RecurrenceRule::new(Frequency::Daily).bound(),
                RecurrenceBound::Unbounded
            );
            assert!(RecurrenceRule::new(Frequency::Daily).is_unbounded());
            assert_eq!(
                RecurrenceRule::new(Frequency::Daily).count(2).bound(),
                RecurrenceBound::Count(2)
            );
        }
    }

    mod expansion_tests {
        use super::*;

        #[test]
        fn test_occurrences_respect_count() {
            let start = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
            let rule = RecurrenceRule::new(Frequency::Weekly).with_interval(2).count(3);
            let dates = rule.occurrences(start, 10).unwrap();
            assert_eq!(
                dates,
                vec![
                    start,
                    Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap(),
                    Utc.with_ymd_and_hms(2025, 1, 29, 9, 0, 0).unwrap(),
                ]
            );
        }

        #[test]
        fn test_occurrences_respect_limit() {
            let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
            let rule = RecurrenceRule::new(Frequency::Daily);
            assert_eq!(rule.occurrences(start, 5).unwrap().len(), 5);
        }

        #[test]
        fn test_occurrences_require_frequency() {
            let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
            let rule = RecurrenceRule::default();
            assert!(matches!(
                rule.occurrences(start, 5),
                Err(CoreError::MissingFrequency)
            ));
        }
    }

    mod record_tests {
        use super::*;

        #[test]
        fn test_record_conversion() {
            let rule = RecurrenceRule::new(Frequency::Monthly).with_interval(3).count(10);
            let record = RecurrenceRuleRecord::from(rule.clone());
            assert_eq!(record.frequency.as_deref(), Some("monthly"));
            assert_eq!(record.occurrence, Some(10));
            assert_eq!(RecurrenceRule::try_from(&record).unwrap(), rule);
        }

        #[test]
        fn test_record_serializes_camel_case_without_nulls() {
            let record = RecurrenceRuleRecord::from(RecurrenceRule::new(Frequency::Daily).count(2));
            let json = serde_json::to_value(&record).unwrap();
            assert_eq!(json, serde_json::json!({"frequency": "daily", "occurrence": 2}));
        }

        #[test]
        fn test_record_without_frequency_is_rejected() {
            let record = RecurrenceRuleRecord {
                interval: Some(1),
                occurrence: Some(3),
                ..Default::default()
            };
            assert!(matches!(
                RecurrenceRule::try_from(&record),
                Err(CoreError::MissingFrequency)
            ));
        }
    }
}
