use anyhow::{Context, Result};
use chrono::{DateTime, Duration};
use chrono_tz::Tz;
use clap::Args;
use schedule_core::{Event, EventData, EventDuration, Frequency, WeekDays};

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Start date/time (RFC 3339, e.g. "2025-03-20T15:00:00+01:00")
    #[arg(short, long)]
    pub start: String,

    #[arg(long)]
    pub summary: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    /// How long each run takes (e.g. "1h 30m")
    #[arg(short, long)]
    pub duration: Option<String>,

    /// Repeat frequency (yearly, monthly, weekly, daily, hourly, ...)
    #[arg(short, long)]
    pub freq: Option<String>,

    #[arg(short, long, requires = "freq")]
    pub interval: Option<u16>,

    /// BYDAY entries such as MO, 2TU or -1FR (repeatable)
    #[arg(long = "weekday", requires = "freq")]
    pub weekdays: Vec<String>,

    /// BYMONTHDAY entries such as 1 or -1 (repeatable)
    #[arg(long = "monthday", requires = "freq", allow_negative_numbers = true)]
    pub monthdays: Vec<i8>,
}

pub fn run(args: NewArgs, timezone: Tz) -> Result<()> {
    let event = build(args, timezone)?;
    print!("{}", event.to_ical_string());
    Ok(())
}

fn build(args: NewArgs, timezone: Tz) -> Result<Event> {
    let start = DateTime::parse_from_rfc3339(&args.start)
        .with_context(|| format!("Could not parse start: \"{}\"", args.start))?
        .with_timezone(&timezone);

    let mut data = EventData::new(start);
    data.summary = args.summary;
    data.description = args.description;
    data.duration = args.duration.as_deref().map(parse_duration).transpose()?;
    data.freq = args
        .freq
        .as_deref()
        .map(str::parse::<Frequency>)
        .transpose()?;
    data.interval = args.interval;
    data.weekdays = parse_weekdays(&args.weekdays)?;
    data.monthdays = args.monthdays;

    if let Some(day) = data.monthdays.iter().find(|d| **d == 0 || d.unsigned_abs() > 31) {
        anyhow::bail!("Invalid month day: {}", day);
    }

    Ok(Event::from_data(data, Some(timezone.name()))?)
}

fn parse_duration(input: &str) -> Result<EventDuration> {
    let std_dur = humantime::parse_duration(input)
        .with_context(|| format!("Could not parse duration: \"{}\"", input))?;
    let chrono_dur = Duration::from_std(std_dur).context("Duration too large")?;
    Ok(EventDuration::from_chrono(chrono_dur))
}

fn parse_weekdays(tokens: &[String]) -> Result<Option<WeekDays>> {
    if tokens.is_empty() {
        return Ok(None);
    }
    if let Some(bad) = tokens
        .iter()
        .find(|token| WeekDays::from_by_day(&[token.as_str()]).is_default())
    {
        anyhow::bail!("Invalid weekday: \"{}\"", bad);
    }
    Ok(Some(WeekDays::from_by_day(tokens)))
}
