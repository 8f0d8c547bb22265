use anyhow::{anyhow, Context as _, Result};
use calbridge_core::datetime;
use calbridge_core::recurrence::{self, Frequency, RecurrenceRule, RecurrenceRuleRecord};
use calbridge_core::timezone::format_with_timezone;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::{print_json, Context};
use crate::cli::{DecodeCommand, EncodeCommand, FrequencyArg, PreviewCommand, RruleCommand};
use crate::parser::parse_date_arg;
use crate::views::table::{display_occurrences, display_rule, ViewOccurrence};

pub fn rrule_command(ctx: &Context, command: RruleCommand) -> Result<()> {
    match command {
        RruleCommand::Decode(cmd) => decode_command(ctx, cmd),
        RruleCommand::Encode(cmd) => encode_command(ctx, cmd),
        RruleCommand::Preview(cmd) => preview_command(ctx, cmd),
    }
}

impl From<FrequencyArg> for Frequency {
    fn from(arg: FrequencyArg) -> Self {
        match arg {
            FrequencyArg::Daily => Frequency::Daily,
            FrequencyArg::Weekly => Frequency::Weekly,
            FrequencyArg::Monthly => Frequency::Monthly,
            FrequencyArg::Yearly => Frequency::Yearly,
        }
    }
}

fn decode_wire(wire: &str) -> Result<RecurrenceRule> {
    recurrence::decode(Some(wire)).ok_or_else(|| anyhow!("Empty recurrence rule"))
}

fn decode_command(ctx: &Context, command: DecodeCommand) -> Result<()> {
    let rule = decode_wire(&command.wire)?;
    if ctx.json {
        return print_json(&RecurrenceRuleRecord::from(rule));
    }
    display_rule(&rule);
    Ok(())
}

fn encode_command(ctx: &Context, command: EncodeCommand) -> Result<()> {
    let mut rule = RecurrenceRule::new(command.freq.into());
    if let Some(interval) = command.interval {
        rule = rule.with_interval(interval);
    }
    if let Some(until) = &command.until {
        let end = parse_date_arg(until)?;
        rule = rule.until(datetime::format_datetime(end));
    }
    if let Some(count) = command.count {
        rule = rule.count(count);
    }

    let wire = recurrence::encode(&rule).context("Failed to encode recurrence rule")?;
    if ctx.json {
        #[derive(Serialize)]
        struct Encoded<'a> {
            rrule: &'a str,
        }
        return print_json(&Encoded { rrule: &wire });
    }
    println!("{}", wire);
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PreviewEntry {
    start: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    local: Option<String>,
}

fn preview_command(ctx: &Context, command: PreviewCommand) -> Result<()> {
    let rule = decode_wire(&command.wire)?;
    let start = parse_date_arg(&command.start)?;
    let limit = command.limit.unwrap_or(ctx.config.preview_count);

    let dates = rule.occurrences(start, limit)?;
    tracing::debug!(count = dates.len(), limit, "expanded preview");

    let mut entries = Vec::with_capacity(dates.len());
    for date in dates {
        let local = match &command.timezone {
            Some(tz) => Some(format_with_timezone(date, tz, "%Y-%m-%d %H:%M %Z")?),
            None => None,
        };
        entries.push(PreviewEntry {
            start: datetime::format_datetime(date),
            local,
        });
    }

    if ctx.json {
        return print_json(&entries);
    }

    if rule.is_unbounded() {
        println!("{}", "Series never ends; showing the first occurrences only.".dimmed());
    }
    let occurrences: Vec<ViewOccurrence> = entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| ViewOccurrence {
            index: i + 1,
            start: entry.start,
            local: entry.local,
        })
        .collect();
    display_occurrences(&occurrences);
    Ok(())
}
