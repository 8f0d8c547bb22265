use calbridge_core::datetime::DateInput;
use calbridge_core::location::{LocationAccuracy, LocationRequest, Provider};
use calbridge_core::models::EventRecord;
use calbridge_core::recurrence::{RecurrenceBound, RecurrenceRule};
use calbridge_core::row::ColumnValue;
use comfy_table::{Attribute, Cell, Color, Row, Table};

#[derive(Debug, Clone)]
pub struct ViewOccurrence {
    pub index: usize,
    pub start: String,
    pub local: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ViewLocation {
    pub accuracy: LocationAccuracy,
    pub request: LocationRequest,
    pub provider: Provider,
}

pub fn display_rule(rule: &RecurrenceRule) {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);

    let frequency = match rule.frequency {
        Some(f) => Cell::new(f.to_string()),
        None => Cell::new("unrecognized").fg(Color::Red),
    };
    table.add_row(vec![Cell::new("Frequency"), frequency]);

    let interval = match rule.interval {
        Some(i) => Cell::new(i.to_string()),
        None => Cell::new(format!("{} (default)", rule.effective_interval())).fg(Color::DarkGrey),
    };
    table.add_row(vec![Cell::new("Interval"), interval]);

    let ends = match rule.bound() {
        RecurrenceBound::Date(date) => Cell::new(format!("on {}", date)),
        RecurrenceBound::Count(n) => Cell::new(format!("after {} occurrences", n)),
        RecurrenceBound::Unbounded => Cell::new("never").fg(Color::Yellow),
    };
    table.add_row(vec![Cell::new("Ends"), ends]);

    println!("{table}");
}

pub fn display_occurrences(occurrences: &[ViewOccurrence]) {
    if occurrences.is_empty() {
        println!("No occurrences found.");
        return;
    }

    let with_local = occurrences.iter().any(|o| o.local.is_some());
    let mut table = Table::new();
    if with_local {
        table.set_header(vec!["#", "Start (UTC)", "Local"]);
    } else {
        table.set_header(vec!["#", "Start (UTC)"]);
    }

    for occurrence in occurrences {
        let mut row = Row::new();
        row.add_cell(Cell::new(occurrence.index));
        row.add_cell(Cell::new(&occurrence.start));
        if with_local {
            row.add_cell(Cell::new(occurrence.local.as_deref().unwrap_or("")));
        }
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_values<'a>(values: impl IntoIterator<Item = (&'a String, &'a ColumnValue)>) {
    let mut table = Table::new();
    table.set_header(vec!["Column", "Value"]);

    for (column, value) in values {
        let value_cell = match value {
            ColumnValue::Null => Cell::new("NULL").fg(Color::DarkGrey),
            ColumnValue::Integer(v) => Cell::new(v),
            ColumnValue::Text(s) => Cell::new(s),
            ColumnValue::Bool(b) => Cell::new(b),
        };
        table.add_row(vec![Cell::new(column), value_cell]);
    }

    println!("{table}");
}

fn date_text(date: &Option<DateInput>) -> String {
    match date {
        Some(DateInput::Text(s)) => s.clone(),
        Some(DateInput::Millis(m)) => m.to_string(),
        None => "None".to_string(),
    }
}

pub fn display_events(events: &[EventRecord]) {
    if events.is_empty() {
        println!("No events found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Event", "Title", "Start", "End", "Instance"]);

    for event in events {
        let mut row = Row::new();
        row.add_cell(Cell::new(event.id.as_deref().unwrap_or("?")));

        let mut title = String::new();
        if event.recurrence_rule.is_some() {
            title.push('↻');
            title.push(' ');
        }
        title.push_str(event.title.as_deref().unwrap_or("(untitled)"));
        row.add_cell(Cell::new(title).add_attribute(Attribute::Bold));

        row.add_cell(Cell::new(date_text(&event.start_date)));
        row.add_cell(Cell::new(date_text(&event.end_date)));
        row.add_cell(Cell::new(event.instance_id.as_deref().unwrap_or("")).fg(Color::DarkGrey));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_locations(locations: &[ViewLocation]) {
    let mut table = Table::new();
    table.set_header(vec![
        "Accuracy",
        "Interval (ms)",
        "Distance (m)",
        "Priority",
        "Provider",
    ]);

    for location in locations {
        let provider = format!("{:?}", location.provider).to_lowercase();
        let provider_cell = match location.provider {
            Provider::Gps => Cell::new(provider).fg(Color::Green),
            Provider::Network => Cell::new(provider),
            Provider::Passive => Cell::new(provider).fg(Color::DarkGrey),
        };

        let mut row = Row::new();
        row.add_cell(Cell::new(format!("{:?}", location.accuracy)));
        row.add_cell(Cell::new(location.request.interval));
        row.add_cell(Cell::new(location.request.min_update_distance_meters));
        row.add_cell(Cell::new(format!("{:?}", location.request.priority)));
        row.add_cell(provider_cell);
        table.add_row(row);
    }

    println!("{table}");
}
