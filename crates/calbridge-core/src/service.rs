//! Calendar operations expressed over a [`RowStore`].

use crate::datetime::{self, DateInput};
use crate::enums::{AlarmMethod, CalendarAccessLevel, EventStatus};
use crate::error::CoreError;
use crate::models::{AlarmRecord, AttendeeRecord, CalendarRecord, EventRecord};
use crate::recurrence::{self, RecurrenceBound, RecurrenceRule};
use crate::row::{self, columns, ColumnValue, Row, ACCOUNT_TYPE_LOCAL};
use crate::store::{RowStore, Selection, Table, Values};
use crate::timezone;

fn resolve_date(input: &DateInput, field: &str) -> Result<i64, CoreError> {
    input
        .to_millis()
        .map_err(|e| CoreError::InvalidDate(format!("{}: {}", field, e)))
}

fn parse_id(id: &str) -> Result<i64, CoreError> {
    id.trim()
        .parse()
        .map_err(|_| CoreError::InvalidInput(format!("'{}' is not a valid id", id)))
}

fn put(values: &mut Values, column: &str, value: impl Into<ColumnValue>) {
    values.insert(column.to_string(), value.into());
}

/// Store column written for a camelCase event field.
fn event_column(field: &str) -> Option<&'static str> {
    Some(match field {
        "calendarId" => columns::CALENDAR_ID,
        "title" => columns::TITLE,
        "location" => columns::EVENT_LOCATION,
        "timeZone" => columns::EVENT_TIMEZONE,
        "endTimeZone" => columns::EVENT_END_TIMEZONE,
        "notes" => columns::DESCRIPTION,
        "recurrenceRule" => columns::RRULE,
        "startDate" => columns::DTSTART,
        "endDate" => columns::DTEND,
        "allDay" => columns::ALL_DAY,
        "availability" => columns::AVAILABILITY,
        "status" => columns::STATUS,
        "organizerEmail" => columns::ORGANIZER,
        "accessLevel" => columns::ACCESS_LEVEL,
        "guestsCanModify" => columns::GUESTS_CAN_MODIFY,
        "guestsCanInviteOthers" => columns::GUESTS_CAN_INVITE_OTHERS,
        "guestsCanSeeGuests" => columns::GUESTS_CAN_SEE_GUESTS,
        "originalId" => columns::ORIGINAL_ID,
        _ => return None,
    })
}

/// Column values for an event write. Only fields present on the record are
/// written, except that an unbounded recurrence replaces `dtend` and
/// `lastDate` with a `duration`.
pub fn event_values(record: &EventRecord) -> Result<Values, CoreError> {
    let mut values = Values::new();

    let start = record
        .start_date
        .as_ref()
        .map(|d| resolve_date(d, "startDate"))
        .transpose()?;
    let end = record
        .end_date
        .as_ref()
        .map(|d| resolve_date(d, "endDate"))
        .transpose()?;

    if let Some(start) = start {
        put(&mut values, columns::DTSTART, start);
    }
    if let Some(end) = end {
        put(&mut values, columns::DTEND, end);
    }

    if let Some(rule_record) = &record.recurrence_rule {
        let rule = RecurrenceRule::try_from(rule_record)?;
        put(&mut values, columns::RRULE, recurrence::encode(&rule)?);

        if rule.bound() == RecurrenceBound::Unbounded {
            let (Some(start), Some(end)) = (start, end) else {
                return Err(CoreError::InvalidInput(
                    "recurring events without an end need startDate and endDate".to_string(),
                ));
            };
            let length = end.checked_sub(start).ok_or_else(|| {
                CoreError::InvalidDate(format!("event length from {} to {} overflows", start, end))
            })?;
            put(&mut values, columns::DTEND, ColumnValue::Null);
            put(&mut values, columns::LAST_DATE, ColumnValue::Null);
            put(
                &mut values,
                columns::DURATION,
                datetime::format_duration_seconds(length / 1000),
            );
        }
    }

    if let Some(title) = &record.title {
        put(&mut values, columns::TITLE, title.as_str());
    }
    if let Some(notes) = &record.notes {
        put(&mut values, columns::DESCRIPTION, notes.as_str());
    }
    if let Some(location) = &record.location {
        put(&mut values, columns::EVENT_LOCATION, location.as_str());
    }
    put(
        &mut values,
        columns::EVENT_TIMEZONE,
        timezone::resolve_timezone(record.time_zone.as_deref())?,
    );
    if let Some(end_tz) = &record.end_time_zone {
        timezone::validate_timezone(end_tz)?;
        put(&mut values, columns::EVENT_END_TIMEZONE, end_tz.as_str());
    }
    if let Some(all_day) = record.all_day {
        put(&mut values, columns::ALL_DAY, all_day);
    }
    if let Some(availability) = record.availability {
        put(&mut values, columns::AVAILABILITY, availability.to_platform());
    }
    if let Some(status) = record.status {
        put(&mut values, columns::STATUS, status.to_platform());
    }
    if let Some(access_level) = record.access_level {
        put(&mut values, columns::ACCESS_LEVEL, access_level.to_platform());
    }
    if let Some(organizer) = &record.organizer_email {
        put(&mut values, columns::ORGANIZER, organizer.as_str());
    }
    if let Some(flag) = record.guests_can_modify {
        put(&mut values, columns::GUESTS_CAN_MODIFY, flag);
    }
    if let Some(flag) = record.guests_can_invite_others {
        put(&mut values, columns::GUESTS_CAN_INVITE_OTHERS, flag);
    }
    if let Some(flag) = record.guests_can_see_guests {
        put(&mut values, columns::GUESTS_CAN_SEE_GUESTS, flag);
    }
    if let Some(alarms) = &record.alarms {
        put(&mut values, columns::HAS_ALARM, !alarms.is_empty());
    }

    Ok(values)
}

/// Column values for a new calendar.
pub fn calendar_values(record: &CalendarRecord) -> Result<Values, CoreError> {
    let title = record
        .title
        .as_deref()
        .ok_or_else(|| CoreError::InvalidInput("new calendars require `title`".to_string()))?;
    let name = record
        .name
        .as_deref()
        .ok_or_else(|| CoreError::InvalidInput("new calendars require `name`".to_string()))?;
    let color = record
        .color
        .as_deref()
        .ok_or_else(|| CoreError::InvalidInput("new calendars require `color`".to_string()))?;
    let color = row::parse_color(color)
        .ok_or_else(|| CoreError::InvalidInput(format!("Invalid color format: {}", color)))?;
    let source = record
        .source
        .as_ref()
        .ok_or_else(|| CoreError::InvalidInput("new calendars require `source`".to_string()))?;
    let account = source.name.as_deref().ok_or_else(|| {
        CoreError::InvalidInput("new calendars require a `source` with a `name`".to_string())
    })?;
    let account_type = if source.is_local_account {
        Some(ACCOUNT_TYPE_LOCAL)
    } else {
        source.source_type.as_deref()
    };

    let join = |levels: Vec<i64>| {
        levels
            .iter()
            .map(i64::to_string)
            .collect::<Vec<_>>()
            .join(",")
    };

    let mut values = Values::new();
    put(&mut values, columns::NAME, name);
    put(&mut values, columns::CALENDAR_DISPLAY_NAME, title);
    put(&mut values, columns::VISIBLE, record.is_visible);
    put(&mut values, columns::SYNC_EVENTS, record.is_synced);
    put(&mut values, columns::IS_PRIMARY, record.is_primary);
    put(&mut values, columns::ACCOUNT_NAME, account);
    put(&mut values, columns::ACCOUNT_TYPE, account_type);
    put(&mut values, columns::CALENDAR_COLOR, color);
    put(
        &mut values,
        columns::CALENDAR_ACCESS_LEVEL,
        CalendarAccessLevel::Owner.to_platform(),
    );
    put(&mut values, columns::OWNER_ACCOUNT, account);
    put(
        &mut values,
        columns::CALENDAR_TIME_ZONE,
        timezone::resolve_timezone(record.time_zone.as_deref())?,
    );
    put(
        &mut values,
        columns::ALLOWED_AVAILABILITY,
        join(record.allowed_availabilities.iter().map(|a| a.to_platform()).collect()),
    );
    put(
        &mut values,
        columns::ALLOWED_REMINDERS,
        join(record.allowed_reminders.iter().map(|m| m.to_platform()).collect()),
    );
    put(
        &mut values,
        columns::ALLOWED_ATTENDEE_TYPES,
        join(record.allowed_attendee_types.iter().map(|t| t.to_platform()).collect()),
    );
    Ok(values)
}

pub struct CalendarService<S: RowStore> {
    store: S,
}

impl<S: RowStore> CalendarService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Insert or update an event and return its id. A record with an `id`
    /// updates that event and, when `alarms` is present, replaces its
    /// reminders. Otherwise `calendarId` must name an existing calendar.
    #[tracing::instrument(skip(self, record), fields(id = ?record.id))]
    pub async fn save_event(&self, record: &EventRecord) -> Result<i64, CoreError> {
        let mut values = event_values(record)?;

        let id = match record.id.as_deref() {
            Some(id) => {
                let id = parse_id(id)?;
                if self.store.update(Table::Events, id, values).await? == 0 {
                    return Err(CoreError::NotFound(format!("event {}", id)));
                }
                id
            }
            None => {
                let calendar_id = record
                    .calendar_id
                    .as_deref()
                    .ok_or_else(|| CoreError::InvalidInput("CalendarId is required.".to_string()))?;
                let calendar_id = parse_id(calendar_id)?;
                if self.calendar(calendar_id).await?.is_none() {
                    return Err(CoreError::NotFound(format!(
                        "Couldn't find calendar with given id: {}",
                        calendar_id
                    )));
                }
                put(&mut values, columns::CALENDAR_ID, calendar_id);
                self.store.insert(Table::Events, values).await?
            }
        };

        if let Some(alarms) = &record.alarms {
            self.replace_alarms(id, alarms).await?;
        }
        tracing::debug!(id, "event saved");
        Ok(id)
    }

    pub async fn get_event(&self, id: i64) -> Result<Option<EventRecord>, CoreError> {
        let rows = self.store.query(Table::Events, &Selection::by_id(id)).await?;
        match rows.first() {
            Some(row) => {
                let alarms = self.alarms(id).await?;
                Ok(Some(row::event_from_row(row, Some(alarms))))
            }
            None => Ok(None),
        }
    }

    /// Merge `patch` into the stored event and save it. Fields named in
    /// `nullable_fields` are cleared in the store.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_event(
        &self,
        id: i64,
        patch: &EventRecord,
        nullable_fields: &[&str],
    ) -> Result<EventRecord, CoreError> {
        let current = self
            .get_event(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("event {}", id)))?;
        let merged = current.merged(patch, nullable_fields);

        let mut values = event_values(&merged)?;
        for field in nullable_fields {
            if let Some(column) = event_column(field) {
                put(&mut values, column, ColumnValue::Null);
            }
            if *field == "recurrenceRule" {
                put(&mut values, columns::DURATION, ColumnValue::Null);
            }
        }
        self.store.update(Table::Events, id, values).await?;
        if let Some(alarms) = &merged.alarms {
            self.replace_alarms(id, alarms).await?;
        }

        self.get_event(id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("event {}", id)))
    }

    /// Delete a whole event, or cancel the single occurrence starting at
    /// `instance_start` by writing an exception row.
    #[tracing::instrument(skip(self))]
    pub async fn delete_event(
        &self,
        id: i64,
        instance_start: Option<&DateInput>,
    ) -> Result<bool, CoreError> {
        let Some(instance_start) = instance_start else {
            return Ok(self.store.delete(Table::Events, id).await? > 0);
        };

        let original_instance_time = resolve_date(instance_start, "instanceStartDate")?;
        let Some(event) = self.get_event(id).await? else {
            return Err(CoreError::NotFound(format!("event {}", id)));
        };

        let mut values = Values::new();
        put(&mut values, columns::ORIGINAL_ID, id);
        put(&mut values, columns::ORIGINAL_INSTANCE_TIME, original_instance_time);
        put(&mut values, columns::STATUS, EventStatus::Canceled.to_platform());
        if let Some(calendar_id) = event.calendar_id {
            put(&mut values, columns::CALENDAR_ID, calendar_id);
        }
        let exception_id = self.store.insert(Table::Events, values).await?;
        tracing::debug!(exception_id, original_instance_time, "occurrence canceled");
        Ok(true)
    }

    /// Occurrences starting in `[start, end)`, sorted by start. An empty
    /// `calendar_ids` searches every calendar.
    pub async fn list_events(
        &self,
        calendar_ids: &[String],
        start: &DateInput,
        end: &DateInput,
    ) -> Result<Vec<EventRecord>, CoreError> {
        let from = resolve_date(start, "startDate")?;
        let to = resolve_date(end, "endDate")?;

        let mut selection = Selection::new()
            .between(columns::BEGIN, from, to)
            .order_by(columns::BEGIN);
        if !calendar_ids.is_empty() {
            selection = selection.any_of(
                columns::CALENDAR_ID,
                calendar_ids.iter().map(|id| ColumnValue::from(id.as_str())).collect(),
            );
        }

        let rows = self.store.query(Table::Instances, &selection).await?;
        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            let alarms = match row.opt_millis(columns::EVENT_ID) {
                Some(event_id) => Some(self.alarms(event_id).await?),
                None => None,
            };
            events.push(row::event_from_row(row, alarms));
        }
        Ok(events)
    }

    pub async fn alarms(&self, event_id: i64) -> Result<Vec<AlarmRecord>, CoreError> {
        let selection = Selection::new().eq(columns::EVENT_ID, event_id);
        let rows = self.store.query(Table::Reminders, &selection).await?;
        Ok(rows.iter().map(row::alarm_from_row).collect())
    }

    async fn replace_alarms(&self, event_id: i64, alarms: &[AlarmRecord]) -> Result<(), CoreError> {
        let selection = Selection::new().eq(columns::EVENT_ID, event_id);
        for existing in self.store.query(Table::Reminders, &selection).await? {
            if let Some(reminder_id) = existing.opt_millis(columns::ID) {
                self.store.delete(Table::Reminders, reminder_id).await?;
            }
        }
        for alarm in alarms {
            let mut values = Values::new();
            put(&mut values, columns::EVENT_ID, event_id);
            put(&mut values, columns::MINUTES, -alarm.relative_offset);
            put(
                &mut values,
                columns::METHOD,
                alarm.method.unwrap_or(AlarmMethod::Default).to_platform(),
            );
            self.store.insert(Table::Reminders, values).await?;
        }
        Ok(())
    }

    pub async fn attendees(&self, event_id: i64) -> Result<Vec<AttendeeRecord>, CoreError> {
        let selection = Selection::new().eq(columns::EVENT_ID, event_id);
        let rows = self.store.query(Table::Attendees, &selection).await?;
        Ok(rows.iter().map(row::attendee_from_row).collect())
    }

    #[tracing::instrument(skip(self, attendee))]
    pub async fn add_attendee(
        &self,
        event_id: i64,
        attendee: &AttendeeRecord,
    ) -> Result<i64, CoreError> {
        if self.get_event(event_id).await?.is_none() {
            return Err(CoreError::NotFound(format!("event {}", event_id)));
        }
        let mut values = Values::new();
        put(&mut values, columns::EVENT_ID, event_id);
        put(&mut values, columns::ATTENDEE_NAME, attendee.name.clone());
        put(&mut values, columns::ATTENDEE_EMAIL, attendee.email.clone());
        put(
            &mut values,
            columns::ATTENDEE_RELATIONSHIP,
            attendee.role.map(|r| r.to_platform()),
        );
        put(
            &mut values,
            columns::ATTENDEE_STATUS,
            attendee.status.map(|s| s.to_platform()),
        );
        put(
            &mut values,
            columns::ATTENDEE_TYPE,
            attendee.attendee_type.map(|t| t.to_platform()),
        );
        self.store.insert(Table::Attendees, values).await
    }

    #[tracing::instrument(skip(self, record), fields(name = ?record.name))]
    pub async fn create_calendar(&self, record: &CalendarRecord) -> Result<i64, CoreError> {
        let values = calendar_values(record)?;
        self.store.insert(Table::Calendars, values).await
    }

    pub async fn calendar(&self, id: i64) -> Result<Option<CalendarRecord>, CoreError> {
        let rows = self.store.query(Table::Calendars, &Selection::by_id(id)).await?;
        Ok(rows.first().map(row::calendar_from_row))
    }

    pub async fn calendars(&self) -> Result<Vec<CalendarRecord>, CoreError> {
        let rows = self.store.query(Table::Calendars, &Selection::new()).await?;
        Ok(rows.iter().map(row::calendar_from_row).collect())
    }
}
