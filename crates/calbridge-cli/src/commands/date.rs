use anyhow::{Context as _, Result};
use calbridge_core::datetime;
use calbridge_core::timezone::format_with_timezone;
use chrono::DateTime;
use serde::Serialize;

use super::{print_json, Context};
use crate::cli::{DateCommand, DateFormatCommand, DateParseCommand};

const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f %Z";

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DateOutput {
    date: String,
    millis: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    local: Option<String>,
}

pub fn date_command(ctx: &Context, command: DateCommand) -> Result<()> {
    match command {
        DateCommand::Parse(cmd) => parse_command(ctx, cmd),
        DateCommand::Format(cmd) => format_command(ctx, cmd),
    }
}

fn parse_command(ctx: &Context, command: DateParseCommand) -> Result<()> {
    let millis = datetime::parse(&command.date)
        .with_context(|| format!("'{}' is not a canonical date", command.date))?;

    if ctx.json {
        return print_json(&DateOutput {
            date: command.date,
            millis,
            local: None,
        });
    }
    println!("{}", millis);
    Ok(())
}

fn format_command(ctx: &Context, command: DateFormatCommand) -> Result<()> {
    let date = datetime::format(command.millis)?;
    let local = match &command.timezone {
        Some(tz) => {
            let dt = DateTime::from_timestamp_millis(command.millis)
                .with_context(|| format!("Timestamp {} is out of range", command.millis))?;
            Some(format_with_timezone(dt, tz, LOCAL_FORMAT)?)
        }
        None => None,
    };

    if ctx.json {
        return print_json(&DateOutput {
            date,
            millis: command.millis,
            local,
        });
    }
    println!("{}", date);
    if let Some(local) = local {
        println!("{}", local);
    }
    Ok(())
}
