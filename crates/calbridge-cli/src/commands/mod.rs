use anyhow::Result;
use serde::Serialize;

use crate::config::Config;

pub mod date;
pub mod event;
pub mod location;
pub mod rrule;

/// Settings every command renders against.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub json: bool,
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
