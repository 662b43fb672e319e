//! Logging setup.
//!
//! Library code only emits `tracing` events; the binary builds a
//! [`LogSettings`] from its configuration and installs it once. Loggers are
//! named by their tracing target (the module path, e.g.
//! `schedule_core::event`) and inherit the default level unless overridden.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use crate::error::{ScheduleError, ScheduleResult};

pub const DEFAULT_LOG_LEVEL: &str = "warn";

fn default_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LogSettings {
    /// Level for every logger without an override
    #[serde(default = "default_level")]
    pub level: String,

    /// Per-logger overrides, keyed by tracing target
    #[serde(default)]
    pub loggers: BTreeMap<String, String>,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: default_level(),
            loggers: BTreeMap::new(),
        }
    }
}

impl LogSettings {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_logger(mut self, name: impl Into<String>, level: impl Into<String>) -> Self {
        self.loggers.insert(name.into(), level.into());
        self
    }

    /// `EnvFilter` directives, e.g. `warn,schedule_core::event=debug`.
    pub fn directives(&self) -> ScheduleResult<String> {
        let mut directives = vec![parse_level(&self.level)?.to_string()];
        for (name, level) in &self.loggers {
            directives.push(format!("{}={}", name, parse_level(level)?));
        }
        Ok(directives.join(","))
    }

    /// Build the filter. A non-empty `RUST_LOG` replaces the configured levels.
    pub fn env_filter(&self) -> ScheduleResult<EnvFilter> {
        let directives = match std::env::var(EnvFilter::DEFAULT_ENV) {
            Ok(from_env) if !from_env.trim().is_empty() => from_env,
            _ => self.directives()?,
        };
        EnvFilter::try_new(&directives).map_err(|e| ScheduleError::Logging(e.to_string()))
    }

    /// Install a stderr subscriber for the whole process.
    pub fn init(&self) -> ScheduleResult<()> {
        tracing_subscriber::fmt()
            .with_env_filter(self.env_filter()?)
            .with_target(true)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| ScheduleError::Logging(e.to_string()))
    }
}

fn parse_level(level: &str) -> ScheduleResult<LevelFilter> {
    LevelFilter::from_str(level.trim())
        .map_err(|_| ScheduleError::Logging(format!("invalid log level '{}'", level)))
}
