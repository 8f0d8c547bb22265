use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};
use calbridge_core::datetime::{self, DateInput};
use calbridge_core::models::{CalendarRecord, EventRecord, Source};
use calbridge_core::row::ColumnValue;
use calbridge_core::service::{event_values, CalendarService};
use calbridge_core::store::InMemoryStore;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::{print_json, Context};
use crate::cli::{EventCommand, EventExpandCommand, EventFileCommand};
use crate::parser::parse_date_arg;
use crate::views::table::{display_events, display_values};

pub async fn event_command(ctx: &Context, command: EventCommand) -> Result<()> {
    match command {
        EventCommand::Values(cmd) => values_command(ctx, cmd),
        EventCommand::Expand(cmd) => expand_command(ctx, cmd).await,
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("Invalid event JSON in {}", path.display()))
}

fn with_default_timezone(mut record: EventRecord, ctx: &Context) -> EventRecord {
    if record.time_zone.is_none() {
        record.time_zone = Some(ctx.config.default_timezone.clone());
    }
    record
}

fn column_json(value: &ColumnValue) -> Value {
    match value {
        ColumnValue::Null => Value::Null,
        ColumnValue::Integer(v) => Value::from(*v),
        ColumnValue::Text(s) => Value::from(s.as_str()),
        ColumnValue::Bool(b) => Value::from(*b),
    }
}

fn values_command(ctx: &Context, command: EventFileCommand) -> Result<()> {
    let record: EventRecord = read_json(&command.file)?;
    let record = with_default_timezone(record, ctx);
    let values = event_values(&record)?;

    if ctx.json {
        let object: Map<String, Value> = values
            .iter()
            .map(|(column, value)| (column.clone(), column_json(value)))
            .collect();
        return print_json(&object);
    }
    display_values(&values);
    Ok(())
}

/// Device-local calendar the loaded records are written into.
fn scratch_calendar(ctx: &Context) -> CalendarRecord {
    CalendarRecord {
        title: Some("Scratch".to_string()),
        name: Some("scratch".to_string()),
        color: Some("#1E88E5".to_string()),
        time_zone: Some(ctx.config.default_timezone.clone()),
        source: Some(Source {
            name: Some("calbridge".to_string()),
            is_local_account: true,
            ..Default::default()
        }),
        ..Default::default()
    }
}

async fn expand_command(ctx: &Context, command: EventExpandCommand) -> Result<()> {
    let records: Vec<EventRecord> = read_json(&command.file)?;
    let from = parse_date_arg(&command.from)?;
    let to = parse_date_arg(&command.to)?;

    let service = CalendarService::new(InMemoryStore::new());
    let calendar_id = service.create_calendar(&scratch_calendar(ctx)).await?;

    for (i, record) in records.into_iter().enumerate() {
        let mut record = with_default_timezone(record, ctx);
        record.id = None;
        record.instance_id = None;
        record.calendar_id = Some(calendar_id.to_string());
        let id = service
            .save_event(&record)
            .await
            .with_context(|| format!("Event #{} could not be saved", i + 1))?;
        tracing::debug!(index = i, id, "loaded event");
    }

    let events = service
        .list_events(
            &[],
            &DateInput::from(datetime::format_datetime(from)),
            &DateInput::from(datetime::format_datetime(to)),
        )
        .await?;

    if ctx.json {
        return print_json(&events);
    }
    display_events(&events);
    Ok(())
}
