//! Plain-text rendering for schedule-core types.
//!
//! Colors are applied by the commands; everything here returns uncolored
//! text so it can be tested.

use chrono::DateTime;
use chrono_tz::Tz;
use schedule_core::weekdays::{DaySelection, WeekDay};
use schedule_core::{EventDuration, Frequency, Recurrence};

pub trait Render {
    fn render(&self) -> String;
}

impl Render for DateTime<Tz> {
    fn render(&self) -> String {
        self.format("%a %Y-%m-%d %H:%M %Z").to_string()
    }
}

impl Render for EventDuration {
    fn render(&self) -> String {
        if self.is_zero() {
            return "none".to_string();
        }
        let seconds = self.as_seconds();
        let formatted = humantime::format_duration(std::time::Duration::from_secs(
            seconds.unsigned_abs(),
        ));
        if seconds < 0 {
            format!("-{}", formatted)
        } else {
            formatted.to_string()
        }
    }
}

impl Render for Recurrence {
    fn render(&self) -> String {
        let unit = unit(self.freq);
        let mut text = if self.interval <= 1 {
            format!("every {}", unit)
        } else {
            format!("every {} {}s", self.interval, unit)
        };

        let days: Vec<String> = self
            .weekdays
            .selected()
            .map(|(day, selection)| weekday(day, selection))
            .collect();
        if !days.is_empty() {
            text.push_str(&format!(" on {}", days.join(", ")));
        }

        if !self.monthdays.is_empty() {
            let monthdays: Vec<String> = self.monthdays.iter().map(|d| ordinal(*d)).collect();
            text.push_str(&format!(" on the {}", monthdays.join(", ")));
        }

        if let Some(count) = self.count {
            text.push_str(&format!(", {} times", count));
        }
        if let Some(until) = self.until {
            text.push_str(&format!(", until {}", until.format("%Y-%m-%d %H:%M UTC")));
        }

        text
    }
}

fn unit(freq: Frequency) -> &'static str {
    match freq {
        Frequency::Yearly => "year",
        Frequency::Monthly => "month",
        Frequency::Weekly => "week",
        Frequency::Daily => "day",
        Frequency::Hourly => "hour",
        Frequency::Minutely => "minute",
        Frequency::Secondly => "second",
    }
}

fn weekday(day: WeekDay, selection: DaySelection) -> String {
    let name = capitalize(day.name());
    match selection {
        DaySelection::Nth(n) => format!("{} {}", ordinal(n), name),
        DaySelection::Every | DaySelection::Unselected => name,
    }
}

/// `1st`, `22nd`, `last`, `2nd to last`.
fn ordinal(n: impl Into<i16>) -> String {
    let n = n.into();
    if n == -1 {
        return "last".to_string();
    }
    if n < 0 {
        return format!("{} to last", ordinal(-n));
    }
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
