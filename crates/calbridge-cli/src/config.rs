use std::path::Path;

use calbridge_core::timezone::{detect_system_timezone, validate_timezone};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_FILE: &str = "calbridge.toml";

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// `table` or `json`
    pub output: OutputFormat,
    /// tracing filter directive, e.g. `warn` or `calbridge_core=debug`
    pub log_level: String,
    /// IANA zone used when a record has none
    pub default_timezone: String,
    /// Occurrences shown by `rrule preview`
    pub preview_count: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: OutputFormat::Table,
            log_level: "warn".to_string(),
            default_timezone: detect_system_timezone(),
            preview_count: 10,
        }
    }
}

impl Config {
    /// Defaults, then the TOML file, then `CALBRIDGE_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, figment::Error> {
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("CALBRIDGE_"))
            .extract()?;

        if let Err(e) = validate_timezone(&config.default_timezone) {
            return Err(figment::Error::from(e.to_string()));
        }
        Ok(config)
    }
}
