mod commands;
mod input;
mod render;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use schedule_core::config::Settings;

#[derive(Parser)]
#[command(name = "schedule")]
#[command(about = "Inspect and build recurring schedules stored as iCalendar events")]
struct Cli {
    /// IANA timezone to show dates in (e.g. "Europe/Berlin")
    #[arg(long, global = true)]
    timezone: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show start, duration, recurrence and next run
    Show {
        /// VCALENDAR or schedule JSON file, or "-" for stdin
        file: String,
    },
    /// Print the next run
    Next {
        /// VCALENDAR or schedule JSON file, or "-" for stdin
        file: String,
    },
    /// List upcoming runs
    Upcoming {
        /// VCALENDAR or schedule JSON file, or "-" for stdin
        file: String,

        /// List runs until this date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "days")]
        until: Option<String>,

        /// List runs for this many days
        #[arg(long)]
        days: Option<i64>,
    },
    /// Build a new schedule event and print it as VCALENDAR
    New(commands::new::NewArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().context("Could not load configuration")?;
    settings
        .logging
        .init()
        .context("Could not set up logging")?;

    let timezone = resolve_timezone(cli.timezone.as_deref(), &settings)?;
    tracing::debug!(timezone = %timezone.name(), "Resolved display timezone");

    match cli.command {
        Commands::Show { file } => commands::show::run(&file, timezone, &settings),
        Commands::Next { file } => commands::next::run(&file, timezone, &settings),
        Commands::Upcoming { file, until, days } => {
            commands::upcoming::run(&file, timezone, &settings, until.as_deref(), days)
        }
        Commands::New(args) => commands::new::run(args, timezone),
    }
}

/// `--timezone`, then the configured zone, then the system zone, then UTC.
fn resolve_timezone(flag: Option<&str>, settings: &Settings) -> Result<Tz> {
    if let Some(name) = flag.or(settings.timezone.as_deref()) {
        return name
            .parse::<Tz>()
            .map_err(|_| anyhow::anyhow!("Unknown timezone '{}'", name));
    }

    match iana_time_zone::get_timezone() {
        Ok(name) => Ok(name.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(timezone = %name, "Unknown system timezone, using UTC");
            Tz::UTC
        })),
        Err(err) => {
            tracing::warn!(error = %err, "Could not read system timezone, using UTC");
            Ok(Tz::UTC)
        }
    }
}
