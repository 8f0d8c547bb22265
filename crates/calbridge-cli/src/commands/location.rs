use anyhow::Result;
use calbridge_core::location::{LocationAccuracy, LocationOptions, LocationRequest, Provider};
use serde::Serialize;

use super::{print_json, Context};
use crate::cli::{AccuracyArg, LocationCommand, LocationParamsCommand};
use crate::views::table::{display_locations, ViewLocation};

impl From<AccuracyArg> for LocationAccuracy {
    fn from(arg: AccuracyArg) -> Self {
        match arg {
            AccuracyArg::Lowest => LocationAccuracy::Lowest,
            AccuracyArg::Low => LocationAccuracy::Low,
            AccuracyArg::Balanced => LocationAccuracy::Balanced,
            AccuracyArg::High => LocationAccuracy::High,
            AccuracyArg::Highest => LocationAccuracy::Highest,
            AccuracyArg::BestForNavigation => LocationAccuracy::BestForNavigation,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LocationOutput {
    accuracy: LocationAccuracy,
    request: LocationRequest,
    provider: Provider,
}

pub fn location_command(ctx: &Context, command: LocationCommand) -> Result<()> {
    match command {
        LocationCommand::Params(cmd) => params_command(ctx, cmd),
    }
}

fn params_command(ctx: &Context, command: LocationParamsCommand) -> Result<()> {
    let tiers: Vec<LocationAccuracy> = match command.accuracy {
        Some(arg) => vec![arg.into()],
        None => LocationAccuracy::ALL.to_vec(),
    };

    let rows: Vec<LocationOutput> = tiers
        .into_iter()
        .map(|accuracy| {
            let options = LocationOptions {
                accuracy: Some(accuracy.level()),
                time_interval: command.time_interval,
                distance_interval: command.distance_interval,
            };
            LocationOutput {
                accuracy,
                request: options.to_request(),
                provider: accuracy.provider(command.headset),
            }
        })
        .collect();

    if ctx.json {
        return print_json(&rows);
    }

    let views: Vec<ViewLocation> = rows
        .into_iter()
        .map(|row| ViewLocation {
            accuracy: row.accuracy,
            request: row.request,
            provider: row.provider,
        })
        .collect();
    display_locations(&views);
    Ok(())
}
