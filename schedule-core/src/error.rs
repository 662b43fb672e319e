//! Error types for the schedule model.

use thiserror::Error;

/// Errors that can occur while building or reading schedule events.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("No VEVENT found in calendar data")]
    MissingEvent,

    #[error("Invalid recurrence rule: {0}")]
    InvalidRecurrence(String),

    #[error("Invalid duration '{0}'")]
    InvalidDuration(String),

    #[error("Unknown timezone '{0}'")]
    UnknownTimezone(String),

    #[error("Logging setup error: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for ScheduleError {
    fn from(err: config::ConfigError) -> Self {
        ScheduleError::Config(err.to_string())
    }
}

/// Result type alias for schedule operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
