use anyhow::Result;
use chrono_tz::Tz;
use owo_colors::OwoColorize;
use schedule_core::config::Settings;

use crate::input::load_event;
use crate::render::Render;

pub fn run(file: &str, timezone: Tz, settings: &Settings) -> Result<()> {
    let event = load_event(file, timezone, settings)?;

    match event.next_date() {
        Some(date) => println!("{}", date.render()),
        None => println!("{}", "No next run".dimmed()),
    }

    Ok(())
}
