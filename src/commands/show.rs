use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use schedule_core::Event;
use schedule_core::config::Settings;

use crate::input::load_event;
use crate::render::Render;

pub fn run(file: &str, timezone: Tz, settings: &Settings) -> Result<()> {
    let event = load_event(file, timezone, settings)?;

    for (label, value) in describe(&event, Utc::now()) {
        println!("{} {}", format!("{:<12}", label).dimmed(), value);
    }

    Ok(())
}

/// Label/value pairs shown for an event.
fn describe(event: &Event, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
    let mut lines = Vec::new();

    if let Some(summary) = event.summary() {
        lines.push(("Summary:", summary.to_string()));
    }
    if let Some(description) = event.description() {
        lines.push(("Description:", description.to_string()));
    }

    let start = event
        .start_date()
        .map(|date| date.render())
        .unwrap_or_else(|| "none".to_string());
    lines.push(("Start:", start));
    lines.push(("Duration:", event.duration().render()));

    let recurrence = event
        .recurrence()
        .map(|rule| rule.render())
        .unwrap_or_else(|| "once".to_string());
    lines.push(("Repeats:", recurrence));

    let next = event
        .next_date_at(now)
        .map(|date| date.render())
        .unwrap_or_else(|| "No next run".to_string());
    lines.push(("Next run:", next));

    lines
}
