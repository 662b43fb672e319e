//! The schedule event model.
//!
//! An [`Event`] wraps exactly one VEVENT plus the timezone the schedule is
//! displayed in, and answers the questions a schedule list needs: when does
//! it start, how long does it run, how does it repeat and when is the next
//! run.

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use uuid::Uuid;

use crate::duration::EventDuration;
use crate::error::{ScheduleError, ScheduleResult};
use crate::event_time::EventTime;
use crate::ics::{VEvent, generate_ics, parse_vevent};
use crate::recurrence::{
    DEFAULT_MAX_DUPLICATE_RETRIES, DuplicateGuard, Frequency, OccurrenceError, Recurrence,
    build_rrule_set, next_occurrence, occurrences_between,
};
use crate::weekdays::WeekDays;

/// Discrete fields for building a new event.
#[derive(Debug, Clone)]
pub struct EventData {
    pub description: Option<String>,
    pub duration: Option<EventDuration>,
    pub freq: Option<Frequency>,
    pub interval: Option<u16>,
    pub monthdays: Vec<i8>,
    pub start_date: DateTime<Tz>,
    pub summary: Option<String>,
    pub weekdays: Option<WeekDays>,
}

impl EventData {
    pub fn new(start_date: DateTime<Tz>) -> Self {
        EventData {
            description: None,
            duration: None,
            freq: None,
            interval: None,
            monthdays: Vec::new(),
            start_date,
            summary: None,
            weekdays: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    vevent: VEvent,
    timezone: Option<Tz>,
    recurrence: Option<Recurrence>,
    max_duplicate_retries: u32,
}

impl Event {
    /// Parse the first VEVENT out of VCALENDAR text.
    ///
    /// `timezone` is an IANA name such as `Europe/Berlin`; `None` or an empty
    /// string means UTC.
    pub fn from_ical(ical: &str, timezone: Option<&str>) -> ScheduleResult<Self> {
        let timezone = parse_timezone(timezone)?;
        let vevent = parse_vevent(ical)?;
        Self::from_vevent(vevent, timezone)
    }

    /// Build a new event with a fresh UID.
    ///
    /// With a timezone, DTSTART is written as wall-clock time with a TZID so
    /// the recurrence keeps its local time across DST changes; otherwise it
    /// is written in UTC.
    pub fn from_data(data: EventData, timezone: Option<&str>) -> ScheduleResult<Self> {
        let timezone = parse_timezone(timezone)?;

        let start = match timezone {
            Some(tz) => EventTime::DateTimeZoned {
                datetime: data.start_date.with_timezone(&tz).naive_local(),
                tzid: tz.name().to_string(),
            },
            None => EventTime::DateTimeUtc(data.start_date.with_timezone(&Utc)),
        };

        let rrule = data.freq.map(|freq| {
            Recurrence {
                interval: data.interval.unwrap_or(1),
                weekdays: data.weekdays.unwrap_or_default(),
                monthdays: data.monthdays.clone(),
                ..Recurrence::new(freq)
            }
            .to_rrule_string()
        });

        let vevent = VEvent {
            uid: Uuid::new_v4().to_string(),
            summary: data.summary,
            description: data.description,
            start: Some(start),
            end: None,
            duration: data.duration,
            rrule,
        };

        Self::from_vevent(vevent, timezone)
    }

    fn from_vevent(vevent: VEvent, timezone: Option<Tz>) -> ScheduleResult<Self> {
        let recurrence = vevent.rrule.as_deref().map(Recurrence::parse).transpose()?;

        Ok(Event {
            vevent,
            timezone,
            recurrence,
            max_duplicate_retries: DEFAULT_MAX_DUPLICATE_RETRIES,
        })
    }

    /// Limit how many duplicate occurrences in a row are skipped while
    /// looking for the next date.
    pub fn with_max_duplicate_retries(mut self, retries: u32) -> Self {
        self.max_duplicate_retries = retries;
        self
    }

    pub fn uid(&self) -> &str {
        &self.vevent.uid
    }

    pub fn summary(&self) -> Option<&str> {
        self.vevent.summary.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.vevent.description.as_deref()
    }

    pub fn timezone(&self) -> Option<Tz> {
        self.timezone
    }

    pub fn vevent(&self) -> &VEvent {
        &self.vevent
    }

    /// DTSTART converted into the event's timezone.
    pub fn start_date(&self) -> Option<DateTime<Tz>> {
        self.vevent
            .start
            .as_ref()
            .map(|start| start.convert(self.timezone))
    }

    /// None without a start or when the end is out of range.
    pub fn end_date(&self) -> Option<DateTime<Tz>> {
        self.start_date()?
            .checked_add_signed(self.duration().as_chrono())
    }

    /// DURATION, or DTEND - DTSTART when only DTEND is given, else zero.
    pub fn duration(&self) -> EventDuration {
        if let Some(duration) = self.vevent.duration {
            return duration;
        }
        match (&self.vevent.start, &self.vevent.end) {
            (Some(start), Some(end)) => {
                let start = start.convert(self.timezone);
                let end = end.convert(self.timezone);
                EventDuration::from_chrono(end - start)
            }
            _ => EventDuration::default(),
        }
    }

    pub fn duration_in_seconds(&self) -> i64 {
        self.duration().as_seconds()
    }

    pub fn recurrence(&self) -> Option<&Recurrence> {
        self.recurrence.as_ref()
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// The next run at or after the current time.
    pub fn next_date(&self) -> Option<DateTime<Tz>> {
        self.next_date_at(Utc::now())
    }

    /// The next run at or after `now`.
    ///
    /// Returns `None` when the event has no start, has already elapsed, or
    /// when the recurrence keeps producing duplicate dates.
    pub fn next_date_at(&self, now: DateTime<Utc>) -> Option<DateTime<Tz>> {
        let start = self.vevent.start.as_ref()?;

        let Some(rule) = self.vevent.rrule.as_deref() else {
            let start_date = start.convert(self.timezone);
            return (start_date.with_timezone(&Utc) >= now).then_some(start_date);
        };

        let rrule_set = self.rrule_set(rule, start)?;
        self.first_at_or_after(DuplicateGuard::new(rrule_set.into_iter()), now)
    }

    fn first_at_or_after<I, T>(&self, occurrences: I, now: DateTime<Utc>) -> Option<DateTime<Tz>>
    where
        I: IntoIterator<Item = Result<DateTime<T>, OccurrenceError>>,
        T: TimeZone,
    {
        match next_occurrence(occurrences, now, self.max_duplicate_retries) {
            Ok(next) => next.map(|date| date.with_timezone(&self.display_zone())),
            Err(exhausted) => {
                tracing::error!(
                    event = %self.to_ical_string(),
                    date = %exhausted.date,
                    retries = exhausted.retries,
                    "Could not determine next date"
                );
                None
            }
        }
    }

    /// All runs from now up to and including `until`.
    pub fn next_dates(&self, until: DateTime<Utc>) -> Vec<DateTime<Tz>> {
        self.next_dates_between(Utc::now(), until)
    }

    /// All runs in `[now, until]`, ascending. Always empty for events that
    /// do not recur.
    pub fn next_dates_between(&self, now: DateTime<Utc>, until: DateTime<Utc>) -> Vec<DateTime<Tz>> {
        let (Some(start), Some(rule)) = (self.vevent.start.as_ref(), self.vevent.rrule.as_deref())
        else {
            return Vec::new();
        };

        let Some(rrule_set) = self.rrule_set(rule, start) else {
            return Vec::new();
        };

        let window = occurrences_between(
            DuplicateGuard::new(rrule_set.into_iter()),
            now,
            until,
            self.max_duplicate_retries,
        );

        if let Some(exhausted) = window.exhausted {
            tracing::error!(
                event = %self.to_ical_string(),
                date = %exhausted.date,
                retries = exhausted.retries,
                "Stopped listing next dates"
            );
        }

        let zone = self.display_zone();
        window
            .dates
            .into_iter()
            .map(|date| date.with_timezone(&zone))
            .collect()
    }

    /// Serialize into a standalone VCALENDAR.
    pub fn to_ical_string(&self) -> String {
        generate_ics(&self.vevent)
    }

    fn display_zone(&self) -> Tz {
        self.timezone.unwrap_or(Tz::UTC)
    }

    fn rrule_set(&self, rule: &str, start: &EventTime) -> Option<rrule::RRuleSet> {
        match build_rrule_set(rule, start.anchor(self.timezone)) {
            Ok(rrule_set) => Some(rrule_set),
            Err(err) => {
                tracing::error!(
                    event = %self.to_ical_string(),
                    error = %err,
                    "Could not expand recurrence"
                );
                None
            }
        }
    }
}

fn parse_timezone(timezone: Option<&str>) -> ScheduleResult<Option<Tz>> {
    match timezone.map(str::trim) {
        None | Some("") => Ok(None),
        Some(name) => name
            .parse::<Tz>()
            .map(Some)
            .map_err(|_| ScheduleError::UnknownTimezone(name.to_string())),
    }
}
