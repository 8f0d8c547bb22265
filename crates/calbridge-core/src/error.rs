use thiserror::Error;

/// Failure to read or render a timestamp.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateTimeError {
    #[error("Malformed date string: '{0}'")]
    Malformed(String),

    #[error("Timestamp {0} is outside the canonical date range")]
    OutOfRange(i64),
}

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Recurrence rule has no frequency")]
    MissingFrequency,

    #[error("Recurrence interval must be positive, got {0}")]
    InvalidInterval(u32),

    #[error("Recurrence occurrence count must be positive, got {0}")]
    InvalidCount(u32),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Recurrence expansion failed: {0}")]
    Recurrence(String),

    #[error("Row store error: {0}")]
    Store(String),

    #[error(transparent)]
    DateTime(#[from] DateTimeError),
}
