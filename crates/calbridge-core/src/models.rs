use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;

use crate::datetime::DateInput;
use crate::enums::{
    AlarmMethod, AttendeeRole, AttendeeStatus, AttendeeType, CalendarAccessLevel, CalendarEntity,
    EventAccessLevel, EventAvailability, EventStatus,
};
use crate::recurrence::RecurrenceRuleRecord;

/// Patch value wins unless the field is listed as explicitly nulled.
fn pick<T: Clone>(
    field: &str,
    nulled: &HashSet<&str>,
    patch: &Option<T>,
    current: &Option<T>,
) -> Option<T> {
    if nulled.contains(field) {
        None
    } else {
        patch.clone().or_else(|| current.clone())
    }
}

/// A reminder attached to an event. `relative_offset` is in minutes relative
/// to the event start, so a reminder ten minutes before is `-10`.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmRecord {
    pub relative_offset: i64,
    pub method: Option<AlarmMethod>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: Option<String>,
    pub calendar_id: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub time_zone: Option<String>,
    pub end_time_zone: Option<String>,
    pub notes: Option<String>,
    pub alarms: Option<Vec<AlarmRecord>>,
    pub recurrence_rule: Option<RecurrenceRuleRecord>,
    pub start_date: Option<DateInput>,
    pub end_date: Option<DateInput>,
    pub all_day: Option<bool>,
    pub availability: Option<EventAvailability>,
    pub status: Option<EventStatus>,
    pub organizer_email: Option<String>,
    pub access_level: Option<EventAccessLevel>,
    pub guests_can_modify: Option<bool>,
    pub guests_can_invite_others: Option<bool>,
    pub guests_can_see_guests: Option<bool>,
    pub original_id: Option<String>,
    /// Set only on records read from the instances view.
    pub instance_id: Option<String>,
}

impl EventRecord {
    /// Apply a partial update. Fields present in `patch` replace the current
    /// values; fields named in `nullable_fields` (camelCase) are cleared. The
    /// identity fields `id` and `instanceId` are never taken from the patch.
    pub fn merged(&self, patch: &EventRecord, nullable_fields: &[&str]) -> EventRecord {
        let nulled: HashSet<&str> = nullable_fields.iter().copied().collect();

        EventRecord {
            id: self.id.clone(),
            calendar_id: pick("calendarId", &nulled, &patch.calendar_id, &self.calendar_id),
            title: pick("title", &nulled, &patch.title, &self.title),
            location: pick("location", &nulled, &patch.location, &self.location),
            time_zone: pick("timeZone", &nulled, &patch.time_zone, &self.time_zone),
            end_time_zone: pick("endTimeZone", &nulled, &patch.end_time_zone, &self.end_time_zone),
            notes: pick("notes", &nulled, &patch.notes, &self.notes),
            alarms: pick("alarms", &nulled, &patch.alarms, &self.alarms),
            recurrence_rule: pick(
                "recurrenceRule",
                &nulled,
                &patch.recurrence_rule,
                &self.recurrence_rule,
            ),
            start_date: pick("startDate", &nulled, &patch.start_date, &self.start_date),
            end_date: pick("endDate", &nulled, &patch.end_date, &self.end_date),
            all_day: pick("allDay", &nulled, &patch.all_day, &self.all_day),
            availability: pick("availability", &nulled, &patch.availability, &self.availability),
            status: pick("status", &nulled, &patch.status, &self.status),
            organizer_email: pick(
                "organizerEmail",
                &nulled,
                &patch.organizer_email,
                &self.organizer_email,
            ),
            access_level: pick("accessLevel", &nulled, &patch.access_level, &self.access_level),
            guests_can_modify: pick(
                "guestsCanModify",
                &nulled,
                &patch.guests_can_modify,
                &self.guests_can_modify,
            ),
            guests_can_invite_others: pick(
                "guestsCanInviteOthers",
                &nulled,
                &patch.guests_can_invite_others,
                &self.guests_can_invite_others,
            ),
            guests_can_see_guests: pick(
                "guestsCanSeeGuests",
                &nulled,
                &patch.guests_can_see_guests,
                &self.guests_can_see_guests,
            ),
            original_id: pick("originalId", &nulled, &patch.original_id, &self.original_id),
            instance_id: self.instance_id.clone(),
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub role: Option<AttendeeRole>,
    pub status: Option<AttendeeStatus>,
    #[serde(rename = "type")]
    pub attendee_type: Option<AttendeeType>,
    pub email: Option<String>,
}

impl AttendeeRecord {
    pub fn merged(&self, patch: &AttendeeRecord, nullable_fields: &[&str]) -> AttendeeRecord {
        let nulled: HashSet<&str> = nullable_fields.iter().copied().collect();

        AttendeeRecord {
            id: self.id.clone(),
            name: pick("name", &nulled, &patch.name, &self.name),
            role: pick("role", &nulled, &patch.role, &self.role),
            status: pick("status", &nulled, &patch.status, &self.status),
            attendee_type: pick("type", &nulled, &patch.attendee_type, &self.attendee_type),
            email: pick("email", &nulled, &patch.email, &self.email),
        }
    }
}

/// Account a calendar belongs to.
#[skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub name: Option<String>,
    #[serde(default)]
    pub is_local_account: bool,
}

fn default_true() -> bool {
    true
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarRecord {
    pub id: Option<String>,
    pub title: Option<String>,
    pub name: Option<String>,
    pub source: Option<Source>,
    /// `#RRGGBB`
    pub color: Option<String>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default = "default_true")]
    pub is_synced: bool,
    pub time_zone: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
    pub entity_type: Option<CalendarEntity>,
    #[serde(default = "default_true")]
    pub allows_modifications: bool,
    #[serde(default)]
    pub allowed_availabilities: Vec<EventAvailability>,
    #[serde(default)]
    pub allowed_reminders: Vec<AlarmMethod>,
    #[serde(default)]
    pub allowed_attendee_types: Vec<AttendeeType>,
    pub owner_account: Option<String>,
    pub access_level: Option<CalendarAccessLevel>,
}

impl Default for CalendarRecord {
    fn default() -> Self {
        Self {
            id: None,
            title: None,
            name: None,
            source: None,
            color: None,
            is_visible: true,
            is_synced: true,
            time_zone: None,
            is_primary: false,
            entity_type: None,
            allows_modifications: true,
            allowed_availabilities: Vec::new(),
            allowed_reminders: Vec::new(),
            allowed_attendee_types: Vec::new(),
            owner_account: None,
            access_level: None,
        }
    }
}
