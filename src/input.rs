//! Reading schedule events from files or stdin.
//!
//! Accepts either raw VCALENDAR text or a schedule element as JSON (as
//! delivered by the management service). A schedule that carries its own
//! timezone keeps it; otherwise the display timezone is used.

use std::io::Read;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use schedule_core::config::Settings;
use schedule_core::{Event, Schedule};

pub fn load_event(source: &str, timezone: Tz, settings: &Settings) -> Result<Event> {
    let text = read_source(source)?;
    parse_event(&text, timezone, settings)
}

fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Could not read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(source).with_context(|| format!("Could not read {}", source))
}

pub fn parse_event(text: &str, timezone: Tz, settings: &Settings) -> Result<Event> {
    let event = if text.trim_start().starts_with('{') {
        let element: serde_json::Value =
            serde_json::from_str(text).context("Could not parse schedule JSON")?;
        let schedule = Schedule::from_element(&element);

        match (schedule.event, schedule.timezone) {
            (Some(event), Some(_)) => event,
            _ => {
                let ical = schedule
                    .icalendar
                    .with_context(|| format!("Schedule '{}' has no icalendar", schedule.id))?;
                Event::from_ical(&ical, Some(timezone.name()))
                    .with_context(|| format!("Could not parse icalendar of schedule '{}'", schedule.id))?
            }
        }
    } else {
        Event::from_ical(text, Some(timezone.name())).context("Could not parse iCalendar")?
    };

    Ok(event.with_max_duplicate_retries(settings.max_duplicate_retries))
}
