//! Layered configuration.
//!
//! Defaults, then `~/.config/schedule/config.toml`, then `SCHEDULE_*`
//! environment variables (`SCHEDULE_LOGGING__LEVEL=debug`).

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::Deserialize;

use crate::error::{ScheduleError, ScheduleResult};
use crate::logging::{DEFAULT_LOG_LEVEL, LogSettings};
use crate::recurrence::DEFAULT_MAX_DUPLICATE_RETRIES;

/// Default horizon for listing upcoming runs.
pub const DEFAULT_UPCOMING_DAYS: i64 = 14;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// IANA timezone schedules are shown in. Falls back to the system zone.
    pub timezone: Option<String>,

    pub upcoming_days: i64,

    pub max_duplicate_retries: u32,

    #[serde(default)]
    pub logging: LogSettings,
}

impl Settings {
    pub fn config_path() -> ScheduleResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ScheduleError::Config("Could not determine config directory".into()))?
            .join("schedule");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default config file (if it exists) and the environment.
    pub fn load() -> ScheduleResult<Self> {
        let path = Self::config_path().ok();
        Self::load_from(path.as_deref())
    }

    /// Load from `path` (if given and present) and the environment.
    pub fn load_from(path: Option<&Path>) -> ScheduleResult<Self> {
        let mut builder = defaults()?;
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(false));
        }
        Self::build(builder.add_source(environment()))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> ScheduleResult<Self> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        if settings.upcoming_days <= 0 {
            return Err(ScheduleError::Config(format!(
                "upcoming_days must be positive, got {}",
                settings.upcoming_days
            )));
        }
        Ok(settings)
    }
}

/// `SCHEDULE_UPCOMING_DAYS`, `SCHEDULE_LOGGING__LEVEL`, ...
fn environment() -> Environment {
    Environment::with_prefix("SCHEDULE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

fn defaults() -> ScheduleResult<ConfigBuilder<DefaultState>> {
    Ok(Config::builder()
        .set_default("upcoming_days", DEFAULT_UPCOMING_DAYS)?
        .set_default(
            "max_duplicate_retries",
            i64::from(DEFAULT_MAX_DUPLICATE_RETRIES),
        )?
        .set_default("logging.level", DEFAULT_LOG_LEVEL)?)
}
