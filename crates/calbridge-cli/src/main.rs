use clap::Parser;
use calbridge_core::error::CoreError;
use owo_colors::{OwoColorize, Style};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;
mod config;
mod parser;
mod views;

use commands::Context;
use config::{Config, OutputFormat};

fn init_tracing(verbose: u8, config: &Config) {
    let directive = match verbose {
        0 => config.log_level.clone(),
        1 => "info".to_string(),
        2 => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    let (config, config_error) = match Config::load(cli.config.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };
    init_tracing(cli.verbose, &config);
    if let Some(e) = config_error {
        tracing::warn!(error = %e, "could not load configuration, using defaults");
    }

    let ctx = Context {
        json: cli.json || config.output == OutputFormat::Json,
        config,
    };

    let result = match cli.command {
        cli::Commands::Rrule(command) => commands::rrule::rrule_command(&ctx, command),
        cli::Commands::Date(command) => commands::date::date_command(&ctx, command),
        cli::Commands::Event(command) => commands::event::event_command(&ctx, command).await,
        cli::Commands::Location(command) => {
            commands::location::location_command(&ctx, command)
        }
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();
    let core_error = err.chain().find_map(|e| e.downcast_ref::<CoreError>());

    match core_error {
        Some(CoreError::NotFound(s)) => {
            eprintln!("{} {}", "Error:".style(error_style), s);
        }
        Some(CoreError::InvalidInput(s)) => {
            eprintln!("{} Invalid input: {}", "Error:".style(error_style), s);
        }
        Some(CoreError::InvalidTimezone(s)) => {
            eprintln!(
                "{} Unknown timezone {}",
                "Error:".style(error_style),
                s.yellow()
            );
        }
        Some(e @ (CoreError::InvalidInterval(_) | CoreError::InvalidCount(_))) => {
            eprintln!("{} {}", "Error:".style(error_style), e);
        }
        _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
    }
}
