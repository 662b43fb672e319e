//! iCalendar DURATION values.

use std::fmt;
use std::str::FromStr;

use crate::error::{ScheduleError, ScheduleResult};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;

/// Duration of an event.
///
/// Weeks are always folded into days, so `P2W` reads back as 14 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventDuration {
    pub negative: bool,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl EventDuration {
    /// Normalize a signed number of seconds into days/hours/minutes/seconds.
    pub fn from_seconds(total: i64) -> Self {
        let negative = total < 0;
        let mut rest = total.unsigned_abs();

        let days = rest / SECONDS_PER_DAY as u64;
        rest %= SECONDS_PER_DAY as u64;
        let hours = rest / SECONDS_PER_HOUR as u64;
        rest %= SECONDS_PER_HOUR as u64;
        let minutes = rest / SECONDS_PER_MINUTE as u64;
        let seconds = rest % SECONDS_PER_MINUTE as u64;

        EventDuration {
            negative,
            days: u32::try_from(days).unwrap_or(u32::MAX),
            hours: hours as u32,
            minutes: minutes as u32,
            seconds: seconds as u32,
        }
    }

    pub fn from_chrono(duration: chrono::Duration) -> Self {
        Self::from_seconds(duration.num_seconds())
    }

    pub fn as_seconds(&self) -> i64 {
        let total = i64::from(self.days) * SECONDS_PER_DAY
            + i64::from(self.hours) * SECONDS_PER_HOUR
            + i64::from(self.minutes) * SECONDS_PER_MINUTE
            + i64::from(self.seconds);
        if self.negative { -total } else { total }
    }

    pub fn as_chrono(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.as_seconds())
    }

    pub fn is_zero(&self) -> bool {
        self.as_seconds() == 0
    }
}

impl FromStr for EventDuration {
    type Err = ScheduleError;

    /// Parse `P1W`, `P1DT2H30M`, `-PT15M`, ...
    fn from_str(value: &str) -> ScheduleResult<Self> {
        let trimmed = value.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        let parsed = iso8601::duration(unsigned)
            .map_err(|_| ScheduleError::InvalidDuration(value.to_string()))?;

        let seconds = match parsed {
            iso8601::Duration::Weeks(weeks) => i64::from(weeks) * 7 * SECONDS_PER_DAY,
            iso8601::Duration::YMDHMS {
                year,
                month,
                day,
                hour,
                minute,
                second,
                ..
            } => {
                // RFC 5545 durations have no nominal year or month designators
                if year != 0 || month != 0 {
                    return Err(ScheduleError::InvalidDuration(value.to_string()));
                }
                i64::from(day) * SECONDS_PER_DAY
                    + i64::from(hour) * SECONDS_PER_HOUR
                    + i64::from(minute) * SECONDS_PER_MINUTE
                    + i64::from(second)
            }
        };

        Ok(EventDuration::from_seconds(if negative { -seconds } else { seconds }))
    }
}

impl fmt::Display for EventDuration {
    /// Canonical RFC 5545 form, e.g. `P1DT2H`, `-PT15M`, `PT0S`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("PT0S");
        }
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str("P")?;
        if self.days > 0 {
            write!(f, "{}D", self.days)?;
        }
        if self.hours > 0 || self.minutes > 0 || self.seconds > 0 {
            f.write_str("T")?;
            if self.hours > 0 {
                write!(f, "{}H", self.hours)?;
            }
            if self.minutes > 0 {
                write!(f, "{}M", self.minutes)?;
            }
            if self.seconds > 0 {
                write!(f, "{}S", self.seconds)?;
            }
        }
        Ok(())
    }
}
