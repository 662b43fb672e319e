use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use schedule_core::config::Settings;

use crate::input::load_event;
use crate::render::Render;

pub fn run(
    file: &str,
    timezone: Tz,
    settings: &Settings,
    until: Option<&str>,
    days: Option<i64>,
) -> Result<()> {
    let event = load_event(file, timezone, settings)?;
    let now = Utc::now();
    let until = horizon(now, timezone, until, days.unwrap_or(settings.upcoming_days))?;

    if !event.is_recurring() {
        match event.next_date_at(now) {
            Some(date) if date.with_timezone(&Utc) <= until => println!("{}", date.render()),
            _ => println!("{}", "No upcoming runs".dimmed()),
        }
        return Ok(());
    }

    let dates = event.next_dates_between(now, until);
    if dates.is_empty() {
        println!("{}", "No upcoming runs".dimmed());
    }
    for date in dates {
        println!("{}", date.render());
    }

    Ok(())
}

/// End of the listing window: the end of `until` in `timezone`, or `days`
/// from now.
fn horizon(
    now: DateTime<Utc>,
    timezone: Tz,
    until: Option<&str>,
    days: i64,
) -> Result<DateTime<Utc>> {
    let Some(until) = until else {
        anyhow::ensure!(days > 0, "--days must be positive, got {}", days);
        return Ok(now + Duration::days(days));
    };

    let date = NaiveDate::parse_from_str(until, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", until))?;
    let end_of_day = date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default());

    timezone
        .from_local_datetime(&end_of_day)
        .latest()
        .map(|date| date.with_timezone(&Utc))
        .with_context(|| format!("{} does not exist in {}", end_of_day, timezone.name()))
}
