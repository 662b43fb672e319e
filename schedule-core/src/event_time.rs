//! Date/time values as they appear on VEVENT properties.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

/// A DTSTART/DTEND value, preserving how it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    /// All-day value (`VALUE=DATE`)
    Date(NaiveDate),
    /// `20240101T100000Z`
    DateTimeUtc(DateTime<Utc>),
    /// No timezone at all: wall-clock time wherever it is read
    DateTimeFloating(NaiveDateTime),
    /// `DTSTART;TZID=Europe/Berlin:20240101T100000`
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    /// True for values without any zone (floating date-times and all-day dates).
    pub fn is_floating(&self) -> bool {
        matches!(self, EventTime::Date(_) | EventTime::DateTimeFloating(_))
    }

    /// Absolute instant of this value.
    ///
    /// Floating values and zoned values with an unknown TZID are read as UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            EventTime::Date(d) => d.and_time(chrono::NaiveTime::MIN).and_utc(),
            EventTime::DateTimeUtc(dt) => *dt,
            EventTime::DateTimeFloating(dt) => dt.and_utc(),
            EventTime::DateTimeZoned { datetime, tzid } => match parse_tzid(tzid) {
                Some(tz) => resolve_local(&tz, *datetime).with_timezone(&Utc),
                None => datetime.and_utc(),
            },
        }
    }

    /// Convert to an instant displayed in `timezone`.
    ///
    /// With a timezone, a floating value is taken as wall-clock time in that
    /// zone; anything else keeps its absolute instant. Without a timezone the
    /// instant is shown in UTC.
    pub fn convert(&self, timezone: Option<Tz>) -> DateTime<Tz> {
        match timezone {
            Some(tz) if self.is_floating() => resolve_local(&tz, self.naive_local()),
            Some(tz) => self.to_utc().with_timezone(&tz),
            None => self.to_utc().with_timezone(&Tz::UTC),
        }
    }

    /// The instant a recurrence is expanded from, in the zone its wall-clock
    /// times belong to: the TZID's zone, UTC, or `timezone` for floating values.
    pub fn anchor(&self, timezone: Option<Tz>) -> DateTime<Tz> {
        match self {
            EventTime::DateTimeUtc(dt) => dt.with_timezone(&Tz::UTC),
            EventTime::DateTimeZoned { datetime, tzid } => match parse_tzid(tzid) {
                Some(tz) => resolve_local(&tz, *datetime),
                None => self.convert(timezone),
            },
            EventTime::Date(_) | EventTime::DateTimeFloating(_) => self.convert(timezone),
        }
    }

    fn naive_local(&self) -> NaiveDateTime {
        match self {
            EventTime::Date(d) => d.and_time(chrono::NaiveTime::MIN),
            EventTime::DateTimeUtc(dt) => dt.naive_utc(),
            EventTime::DateTimeFloating(dt) => *dt,
            EventTime::DateTimeZoned { datetime, .. } => *datetime,
        }
    }
}

/// Look up an IANA zone from a TZID parameter (`/Europe/Berlin` is accepted too).
pub fn parse_tzid(tzid: &str) -> Option<Tz> {
    tzid.trim().trim_start_matches('/').parse().ok()
}

/// Place a wall-clock time in `tz`.
///
/// Ambiguous times (DST fold) take the earlier instant; times inside a DST
/// gap move forward by an hour.
pub(crate) fn resolve_local(tz: &Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}
