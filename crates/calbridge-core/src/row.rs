//! Raw rows from a calendar store and their conversion into records.

use std::collections::BTreeMap;

use crate::datetime;
use crate::enums::{
    AlarmMethod, AttendeeRole, AttendeeStatus, AttendeeType, CalendarAccessLevel,
    EventAccessLevel, EventAvailability, EventStatus,
};
use crate::models::{AlarmRecord, AttendeeRecord, CalendarRecord, EventRecord, Source};
use crate::recurrence::{self, RecurrenceRuleRecord};

/// Column names used by the calendar provider.
pub mod columns {
    pub const ID: &str = "_id";
    pub const EVENT_ID: &str = "event_id";
    pub const CALENDAR_ID: &str = "calendar_id";
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const EVENT_LOCATION: &str = "eventLocation";
    pub const EVENT_TIMEZONE: &str = "eventTimezone";
    pub const EVENT_END_TIMEZONE: &str = "eventEndTimezone";
    pub const DTSTART: &str = "dtstart";
    pub const DTEND: &str = "dtend";
    pub const DURATION: &str = "duration";
    pub const LAST_DATE: &str = "lastDate";
    pub const RRULE: &str = "rrule";
    pub const ALL_DAY: &str = "allDay";
    pub const AVAILABILITY: &str = "availability";
    pub const STATUS: &str = "eventStatus";
    pub const ORGANIZER: &str = "organizer";
    pub const ACCESS_LEVEL: &str = "accessLevel";
    pub const GUESTS_CAN_MODIFY: &str = "guestsCanModify";
    pub const GUESTS_CAN_INVITE_OTHERS: &str = "guestsCanInviteOthers";
    pub const GUESTS_CAN_SEE_GUESTS: &str = "guestsCanSeeGuests";
    pub const ORIGINAL_ID: &str = "original_id";
    pub const ORIGINAL_INSTANCE_TIME: &str = "originalInstanceTime";
    pub const HAS_ALARM: &str = "hasAlarm";

    pub const BEGIN: &str = "begin";
    pub const END: &str = "end";

    pub const MINUTES: &str = "minutes";
    pub const METHOD: &str = "method";

    pub const ATTENDEE_NAME: &str = "attendeeName";
    pub const ATTENDEE_EMAIL: &str = "attendeeEmail";
    pub const ATTENDEE_RELATIONSHIP: &str = "attendeeRelationship";
    pub const ATTENDEE_STATUS: &str = "attendeeStatus";
    pub const ATTENDEE_TYPE: &str = "attendeeType";

    pub const CALENDAR_DISPLAY_NAME: &str = "calendar_displayName";
    pub const NAME: &str = "name";
    pub const CALENDAR_COLOR: &str = "calendar_color";
    pub const OWNER_ACCOUNT: &str = "ownerAccount";
    pub const CALENDAR_TIME_ZONE: &str = "calendar_timezone";
    pub const VISIBLE: &str = "visible";
    pub const SYNC_EVENTS: &str = "sync_events";
    pub const IS_PRIMARY: &str = "isPrimary";
    pub const CALENDAR_ACCESS_LEVEL: &str = "calendar_access_level";
    pub const ALLOWED_REMINDERS: &str = "allowedReminders";
    pub const ALLOWED_AVAILABILITY: &str = "allowedAvailability";
    pub const ALLOWED_ATTENDEE_TYPES: &str = "allowedAttendeeTypes";
    pub const ACCOUNT_NAME: &str = "account_name";
    pub const ACCOUNT_TYPE: &str = "account_type";
}

/// Account type of calendars that live only on the device.
pub const ACCOUNT_TYPE_LOCAL: &str = "LOCAL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Null,
    Integer(i64),
    Text(String),
    Bool(bool),
}

impl ColumnValue {
    /// String form as the provider would hand it out. Booleans are stored as 0/1.
    pub fn as_text(&self) -> Option<String> {
        match self {
            ColumnValue::Null => None,
            ColumnValue::Integer(v) => Some(v.to_string()),
            ColumnValue::Text(s) => Some(s.clone()),
            ColumnValue::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            ColumnValue::Null => None,
            ColumnValue::Integer(v) => Some(*v),
            ColumnValue::Text(s) => s.trim().parse().ok(),
            ColumnValue::Bool(b) => Some(i64::from(*b)),
        }
    }
}

impl From<i64> for ColumnValue {
    fn from(v: i64) -> Self {
        ColumnValue::Integer(v)
    }
}

impl From<bool> for ColumnValue {
    fn from(v: bool) -> Self {
        ColumnValue::Bool(v)
    }
}

impl From<&str> for ColumnValue {
    fn from(v: &str) -> Self {
        ColumnValue::Text(v.to_string())
    }
}

impl From<String> for ColumnValue {
    fn from(v: String) -> Self {
        ColumnValue::Text(v)
    }
}

impl<T: Into<ColumnValue>> From<Option<T>> for ColumnValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(ColumnValue::Null)
    }
}

/// Read access to one row of a cursor-like source.
pub trait Row {
    fn get(&self, column: &str) -> Option<&ColumnValue>;

    fn has_column(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    /// `None` when the column is missing or null.
    fn opt_string(&self, column: &str) -> Option<String> {
        self.get(column).and_then(ColumnValue::as_text)
    }

    /// 0 when the column is missing, null or not a number.
    fn opt_int(&self, column: &str) -> i64 {
        self.get(column).and_then(ColumnValue::as_int).unwrap_or(0)
    }

    fn opt_millis(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(ColumnValue::as_int)
    }
}

/// A row backed by a column map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MapRow {
    values: BTreeMap<String, ColumnValue>,
}

impl MapRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<ColumnValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<ColumnValue>) {
        self.values.insert(column.to_string(), value.into());
    }

    pub fn extend(&mut self, values: impl IntoIterator<Item = (String, ColumnValue)>) {
        self.values.extend(values);
    }

    pub fn columns(&self) -> impl Iterator<Item = (&String, &ColumnValue)> {
        self.values.iter()
    }
}

impl From<BTreeMap<String, ColumnValue>> for MapRow {
    fn from(values: BTreeMap<String, ColumnValue>) -> Self {
        Self { values }
    }
}

impl Row for MapRow {
    fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.values.get(column)
    }
}

/// Build an event record from an events row or an instances row.
///
/// Instance rows carry `begin`/`end` and an `event_id`; their own `_id`
/// becomes the record's `instanceId`.
pub fn event_from_row(row: &impl Row, alarms: Option<Vec<AlarmRecord>>) -> EventRecord {
    use columns::*;

    let is_instance = row.has_column(BEGIN);
    let (start, end) = if is_instance {
        (row.opt_millis(BEGIN), row.opt_millis(END))
    } else {
        (row.opt_millis(DTSTART), row.opt_millis(DTEND))
    };
    // Open-ended series store a duration instead of an end.
    let end = end.or_else(|| {
        let secs = datetime::parse_duration_seconds(&row.opt_string(DURATION)?)?;
        start?.checked_add(secs.checked_mul(1000)?)
    });

    let id = row.opt_string(EVENT_ID).or_else(|| row.opt_string(ID));
    let instance_id = if is_instance { row.opt_string(ID) } else { None };

    EventRecord {
        id,
        calendar_id: row.opt_string(CALENDAR_ID),
        title: row.opt_string(TITLE),
        location: row.opt_string(EVENT_LOCATION),
        time_zone: row.opt_string(EVENT_TIMEZONE),
        end_time_zone: row.opt_string(EVENT_END_TIMEZONE),
        notes: row.opt_string(DESCRIPTION),
        alarms,
        recurrence_rule: recurrence::decode(row.opt_string(RRULE).as_deref())
            .map(RecurrenceRuleRecord::from),
        start_date: datetime::millis_to_string(start).map(Into::into),
        end_date: datetime::millis_to_string(end).map(Into::into),
        all_day: Some(row.opt_int(ALL_DAY) != 0),
        availability: EventAvailability::from_platform(row.opt_int(AVAILABILITY)),
        status: EventStatus::from_platform(row.opt_int(STATUS)),
        organizer_email: row.opt_string(ORGANIZER),
        access_level: EventAccessLevel::from_platform(row.opt_int(ACCESS_LEVEL)),
        guests_can_modify: Some(row.opt_int(GUESTS_CAN_MODIFY) != 0),
        guests_can_invite_others: Some(row.opt_int(GUESTS_CAN_INVITE_OTHERS) != 0),
        guests_can_see_guests: Some(row.opt_int(GUESTS_CAN_SEE_GUESTS) != 0),
        original_id: row.opt_string(ORIGINAL_ID),
        instance_id,
    }
}

pub fn attendee_from_row(row: &impl Row) -> AttendeeRecord {
    use columns::*;

    AttendeeRecord {
        id: row.opt_string(ID),
        name: row.opt_string(ATTENDEE_NAME),
        role: AttendeeRole::from_platform(row.opt_int(ATTENDEE_RELATIONSHIP)),
        status: AttendeeStatus::from_platform(row.opt_int(ATTENDEE_STATUS)),
        attendee_type: AttendeeType::from_platform(row.opt_int(ATTENDEE_TYPE)),
        email: row.opt_string(ATTENDEE_EMAIL),
    }
}

pub fn alarm_from_row(row: &impl Row) -> AlarmRecord {
    AlarmRecord {
        relative_offset: -row.opt_int(columns::MINUTES),
        method: AlarmMethod::from_platform(row.opt_int(columns::METHOD)),
    }
}

pub fn calendar_from_row(row: &impl Row) -> CalendarRecord {
    use columns::*;

    let access_level = CalendarAccessLevel::from_platform(row.opt_int(CALENDAR_ACCESS_LEVEL))
        .unwrap_or(CalendarAccessLevel::None);
    let account_type = row.opt_string(ACCOUNT_TYPE);

    CalendarRecord {
        id: row.opt_string(ID),
        title: row.opt_string(CALENDAR_DISPLAY_NAME),
        name: row.opt_string(NAME),
        source: Some(Source {
            id: row.opt_string(ACCOUNT_NAME),
            is_local_account: account_type.as_deref() == Some(ACCOUNT_TYPE_LOCAL),
            source_type: account_type,
            name: row.opt_string(ACCOUNT_NAME),
        }),
        color: Some(format_color(row.opt_int(CALENDAR_COLOR))),
        is_visible: row.opt_int(VISIBLE) != 0,
        is_synced: row.opt_int(SYNC_EVENTS) != 0,
        time_zone: row.opt_string(CALENDAR_TIME_ZONE),
        is_primary: row.opt_int(IS_PRIMARY) == 1,
        entity_type: None,
        allows_modifications: access_level.allows_modifications(),
        allowed_availabilities: parse_platform_list(row.opt_string(ALLOWED_AVAILABILITY), |v| {
            EventAvailability::from_platform(v)
        }),
        allowed_reminders: parse_platform_list(row.opt_string(ALLOWED_REMINDERS), |v| {
            Some(AlarmMethod::from_platform(v).unwrap_or(AlarmMethod::Default))
        }),
        allowed_attendee_types: parse_platform_list(row.opt_string(ALLOWED_ATTENDEE_TYPES), |v| {
            Some(AttendeeType::from_platform(v).unwrap_or(AttendeeType::None))
        }),
        owner_account: row.opt_string(OWNER_ACCOUNT),
        access_level: Some(access_level),
    }
}

/// Render a packed ARGB color as `#RRGGBB`, dropping alpha.
pub fn format_color(color: i64) -> String {
    format!("#{:06X}", color & 0x00FF_FFFF)
}

/// Parse `#RRGGBB` (the `#` is optional) into a packed color.
pub fn parse_color(color: &str) -> Option<i64> {
    let hex = color.trim().trim_start_matches('#');
    if hex.is_empty() || hex.len() > 8 {
        return None;
    }
    i64::from_str_radix(hex, 16).ok()
}

/// Comma-separated platform integers. Entries that are not numbers are skipped.
fn parse_platform_list<T>(value: Option<String>, map: impl Fn(i64) -> Option<T>) -> Vec<T> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<i64>() {
            Ok(v) => map(v),
            Err(_) => {
                tracing::debug!(entry, "skipping non-numeric list entry");
                None
            }
        })
        .collect()
}
