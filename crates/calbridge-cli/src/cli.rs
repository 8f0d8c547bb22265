use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Inspect and produce calendar recurrence rules and timestamps
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Emit JSON instead of tables
    #[clap(long, global = true)]
    pub json: bool,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    /// Configuration file (defaults to calbridge.toml)
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Work with recurrence rule wire strings
    #[command(subcommand)]
    Rrule(RruleCommand),
    /// Convert between canonical date strings and epoch milliseconds
    #[command(subcommand)]
    Date(DateCommand),
    /// Work with event records
    #[command(subcommand)]
    Event(EventCommand),
    /// Show location request parameters
    #[command(subcommand)]
    Location(LocationCommand),
}

#[derive(Subcommand, Debug, Clone)]
pub enum RruleCommand {
    /// Decode a wire string such as FREQ=WEEKLY;INTERVAL=2;COUNT=5
    Decode(DecodeCommand),
    /// Encode a rule from its parts
    Encode(EncodeCommand),
    /// List upcoming occurrences of a wire string
    Preview(PreviewCommand),
}

#[derive(Args, Debug, Clone)]
pub struct DecodeCommand {
    /// The wire string
    pub wire: String,
}

#[derive(Args, Debug, Clone)]
pub struct EncodeCommand {
    /// Repeat frequency
    #[clap(long, value_enum)]
    pub freq: FrequencyArg,
    /// Interval between occurrences
    #[clap(long)]
    pub interval: Option<u32>,
    /// Last possible occurrence (canonical date or natural language, e.g. 'next friday')
    #[clap(long, conflicts_with = "count")]
    pub until: Option<String>,
    /// Number of occurrences
    #[clap(long)]
    pub count: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct PreviewCommand {
    /// The wire string
    pub wire: String,
    /// First occurrence (canonical date or natural language)
    #[clap(long)]
    pub start: String,
    /// How many occurrences to show (defaults to preview_count from config)
    #[clap(short = 'n', long)]
    pub limit: Option<u16>,
    /// Also show occurrences in this IANA timezone
    #[clap(long)]
    pub timezone: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum DateCommand {
    /// Canonical date string to epoch milliseconds
    Parse(DateParseCommand),
    /// Epoch milliseconds to canonical date string
    Format(DateFormatCommand),
}

#[derive(Args, Debug, Clone)]
pub struct DateParseCommand {
    /// e.g. 2025-06-01T12:30:45.678Z
    pub date: String,
}

#[derive(Args, Debug, Clone)]
pub struct DateFormatCommand {
    /// Milliseconds since the Unix epoch
    #[clap(allow_hyphen_values = true)]
    pub millis: i64,
    /// Also render in this IANA timezone
    #[clap(long)]
    pub timezone: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum EventCommand {
    /// Show the store columns an event record is written as
    Values(EventFileCommand),
    /// Load event records into a scratch calendar and list occurrences in a range
    Expand(EventExpandCommand),
}

#[derive(Args, Debug, Clone)]
pub struct EventFileCommand {
    /// JSON file holding one event record, or '-' for stdin
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct EventExpandCommand {
    /// JSON file holding an array of event records, or '-' for stdin
    pub file: PathBuf,
    /// Range start (canonical date or natural language)
    #[clap(long)]
    pub from: String,
    /// Range end, exclusive (canonical date or natural language)
    #[clap(long)]
    pub to: String,
}

#[derive(Subcommand, Debug, Clone)]
pub enum LocationCommand {
    /// Request parameters for an accuracy level
    Params(LocationParamsCommand),
}

#[derive(Args, Debug, Clone)]
pub struct LocationParamsCommand {
    /// Accuracy level; omit to list every level
    #[clap(long, value_enum)]
    pub accuracy: Option<AccuracyArg>,
    /// Override the update interval in milliseconds
    #[clap(long)]
    pub time_interval: Option<i64>,
    /// Override the update distance in meters
    #[clap(long)]
    pub distance_interval: Option<f64>,
    /// Resolve providers for a headset device without GPS
    #[clap(long)]
    pub headset: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyArg {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyArg {
    Lowest,
    Low,
    Balanced,
    High,
    Highest,
    BestForNavigation,
}
