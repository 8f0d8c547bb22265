use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::datetime;
use crate::enums::EventStatus;
use crate::error::CoreError;
use crate::recurrence::{self, MAX_EXPANSION};
use crate::row::{columns, ColumnValue, MapRow, Row};

/// Column values for an insert or update.
pub type Values = BTreeMap<String, ColumnValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Events,
    /// Read-only view with one row per occurrence of each event.
    Instances,
    Reminders,
    Attendees,
    Calendars,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Eq(String, ColumnValue),
    In(String, Vec<ColumnValue>),
}

impl Filter {
    fn matches(&self, row: &MapRow) -> bool {
        match self {
            Filter::Eq(column, value) => {
                row.opt_string(column).is_some() && row.opt_string(column) == value.as_text()
            }
            Filter::In(column, values) => {
                let current = row.opt_string(column);
                current.is_some() && values.iter().any(|v| v.as_text() == current)
            }
        }
    }
}

/// Half-open `[from, to)` range over an integer column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Range {
    pub column: String,
    pub from: i64,
    pub to: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub id: Option<i64>,
    pub filters: Vec<Filter>,
    pub range: Option<Range>,
    pub order_by: Option<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by_id(id: i64) -> Self {
        Self {
            id: Some(id),
            ..Default::default()
        }
    }

    pub fn eq(mut self, column: &str, value: impl Into<ColumnValue>) -> Self {
        self.filters.push(Filter::Eq(column.to_string(), value.into()));
        self
    }

    pub fn any_of(mut self, column: &str, values: Vec<ColumnValue>) -> Self {
        self.filters.push(Filter::In(column.to_string(), values));
        self
    }

    pub fn between(mut self, column: &str, from: i64, to: i64) -> Self {
        self.range = Some(Range {
            column: column.to_string(),
            from,
            to,
        });
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by = Some(column.to_string());
        self
    }

    fn matches(&self, row: &MapRow) -> bool {
        if let Some(id) = self.id {
            if row.opt_millis(columns::ID) != Some(id) {
                return false;
            }
        }
        if let Some(range) = &self.range {
            match row.opt_millis(&range.column) {
                Some(v) if v >= range.from && v < range.to => {}
                _ => return false,
            }
        }
        self.filters.iter().all(|f| f.matches(row))
    }
}

/// Tabular calendar storage.
#[async_trait]
pub trait RowStore: Send + Sync {
    async fn query(&self, table: Table, selection: &Selection) -> Result<Vec<MapRow>, CoreError>;
    /// Returns the id of the new row.
    async fn insert(&self, table: Table, values: Values) -> Result<i64, CoreError>;
    /// Returns the number of rows changed.
    async fn update(&self, table: Table, id: i64, values: Values) -> Result<usize, CoreError>;
    /// Returns the number of rows removed.
    async fn delete(&self, table: Table, id: i64) -> Result<usize, CoreError>;
}

#[derive(Debug, Default)]
struct StoreState {
    tables: HashMap<Table, BTreeMap<i64, MapRow>>,
    next_id: i64,
}

/// Process-local store. The instances view is derived from the events table
/// at query time, honoring canceled exception rows.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreState>, CoreError> {
        self.state
            .lock()
            .map_err(|_| CoreError::Store("store lock poisoned".to_string()))
    }
}

#[async_trait]
impl RowStore for InMemoryStore {
    async fn query(&self, table: Table, selection: &Selection) -> Result<Vec<MapRow>, CoreError> {
        let state = self.lock()?;

        let mut rows: Vec<MapRow> = match table {
            Table::Instances => {
                let events = state.tables.get(&Table::Events);
                let window = selection
                    .range
                    .as_ref()
                    .filter(|r| r.column == columns::BEGIN)
                    .map(|r| (r.from, r.to));
                events
                    .map(|events| expand_instances(events, window))
                    .unwrap_or_default()
            }
            _ => state
                .tables
                .get(&table)
                .map(|rows| rows.values().cloned().collect())
                .unwrap_or_default(),
        };

        rows.retain(|row| selection.matches(row));
        if let Some(column) = &selection.order_by {
            rows.sort_by_key(|row| row.opt_int(column));
        }

        tracing::trace!(?table, count = rows.len(), "query");
        Ok(rows)
    }

    async fn insert(&self, table: Table, values: Values) -> Result<i64, CoreError> {
        if table == Table::Instances {
            return Err(CoreError::Store("instances is a read-only view".to_string()));
        }
        let mut state = self.lock()?;
        state.next_id += 1;
        let id = state.next_id;

        let mut row = MapRow::from(values);
        row.set(columns::ID, id);
        state.tables.entry(table).or_default().insert(id, row);
        Ok(id)
    }

    async fn update(&self, table: Table, id: i64, values: Values) -> Result<usize, CoreError> {
        let mut state = self.lock()?;
        match state.tables.get_mut(&table).and_then(|rows| rows.get_mut(&id)) {
            Some(row) => {
                row.extend(values);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, table: Table, id: i64) -> Result<usize, CoreError> {
        let mut state = self.lock()?;
        let removed = state
            .tables
            .get_mut(&table)
            .and_then(|rows| rows.remove(&id))
            .is_some();

        if removed && table == Table::Events {
            // Child rows go with their event, as in the provider.
            for child in [Table::Reminders, Table::Attendees, Table::Events] {
                if let Some(rows) = state.tables.get_mut(&child) {
                    let parent_column = if child == Table::Events {
                        columns::ORIGINAL_ID
                    } else {
                        columns::EVENT_ID
                    };
                    rows.retain(|_, row| row.opt_millis(parent_column) != Some(id));
                }
            }
        }
        Ok(usize::from(removed))
    }
}

fn expand_instances(events: &BTreeMap<i64, MapRow>, window: Option<(i64, i64)>) -> Vec<MapRow> {
    let canceled = EventStatus::Canceled.to_platform();
    let cancellations: Vec<(i64, i64)> = events
        .values()
        .filter(|row| row.opt_int(columns::STATUS) == canceled)
        .filter_map(|row| {
            Some((
                row.opt_millis(columns::ORIGINAL_ID)?,
                row.opt_millis(columns::ORIGINAL_INSTANCE_TIME)?,
            ))
        })
        .collect();

    let mut instances = Vec::new();
    for (id, event) in events {
        let Some(dtstart) = event.opt_millis(columns::DTSTART) else {
            continue;
        };
        let Some(length) = event_length(event, dtstart) else {
            tracing::warn!(event_id = id, "skipping event whose length overflows");
            continue;
        };

        let begins = match occurrence_starts(event, dtstart, window) {
            Ok(begins) => begins,
            Err(e) => {
                tracing::warn!(event_id = id, error = %e, "skipping event with unexpandable recurrence");
                continue;
            }
        };

        for begin in begins {
            if cancellations.contains(&(*id, begin)) {
                continue;
            }
            let Some(end) = begin.checked_add(length) else {
                tracing::warn!(event_id = id, begin, "skipping occurrence whose end overflows");
                continue;
            };
            let mut instance = event.clone();
            instance.set(columns::ID, format!("{}-{}", id, begin));
            instance.set(columns::EVENT_ID, *id);
            instance.set(columns::BEGIN, begin);
            instance.set(columns::END, end);
            instances.push(instance);
        }
    }
    instances
}

/// `None` when the stored end or duration does not fit in epoch millis.
fn event_length(event: &MapRow, dtstart: i64) -> Option<i64> {
    if let Some(dtend) = event.opt_millis(columns::DTEND) {
        return dtend.checked_sub(dtstart);
    }
    match event
        .opt_string(columns::DURATION)
        .as_deref()
        .and_then(datetime::parse_duration_seconds)
    {
        Some(secs) => secs.checked_mul(1000),
        None => Some(0),
    }
}

fn occurrence_starts(
    event: &MapRow,
    dtstart: i64,
    window: Option<(i64, i64)>,
) -> Result<Vec<i64>, CoreError> {
    let rule = recurrence::decode(event.opt_string(columns::RRULE).as_deref())
        .filter(|rule| rule.frequency.is_some());
    let Some(rule) = rule else {
        return Ok(vec![dtstart]);
    };

    let start = to_datetime(dtstart)?;
    let dates = match window {
        Some((from, to)) => {
            let from = to_datetime(from.max(dtstart))?;
            let to = to_datetime(to.saturating_sub(1))?;
            if from > to {
                return Ok(Vec::new());
            }
            rule.occurrences_between(start, from, to)?
        }
        None => rule.occurrences(start, MAX_EXPANSION)?,
    };

    // Expansion runs at second precision; keep the original sub-second offset.
    let offset = dtstart - start.timestamp() * 1000;
    Ok(dates
        .into_iter()
        .map(|dt| dt.timestamp() * 1000 + offset)
        .collect())
}

fn to_datetime(millis: i64) -> Result<DateTime<Utc>, CoreError> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt - Duration::milliseconds(i64::from(dt.timestamp_subsec_millis())))
        .ok_or_else(|| CoreError::InvalidDate(format!("timestamp {} out of range", millis)))
}
