//! Recurrence rules and occurrence iteration.
//!
//! Rule text is validated and expanded by the `rrule` crate. Iteration goes
//! through [`DuplicateGuard`], which reports a repeated instant as an error
//! instead of yielding it twice, and the callers below skip such errors up
//! to a retry limit.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rrule::{RRule, RRuleSet, Unvalidated};
use thiserror::Error;

use crate::error::{ScheduleError, ScheduleResult};
use crate::event_time::resolve_local;
use crate::weekdays::WeekDays;

/// How many consecutive duplicate occurrences are skipped before giving up.
pub const DEFAULT_MAX_DUPLICATE_RETRIES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
    Minutely,
    Secondly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Yearly => "YEARLY",
            Frequency::Monthly => "MONTHLY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Daily => "DAILY",
            Frequency::Hourly => "HOURLY",
            Frequency::Minutely => "MINUTELY",
            Frequency::Secondly => "SECONDLY",
        }
    }
}

impl FromStr for Frequency {
    type Err = ScheduleError;

    fn from_str(s: &str) -> ScheduleResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "YEARLY" => Ok(Frequency::Yearly),
            "MONTHLY" => Ok(Frequency::Monthly),
            "WEEKLY" => Ok(Frequency::Weekly),
            "DAILY" => Ok(Frequency::Daily),
            "HOURLY" => Ok(Frequency::Hourly),
            "MINUTELY" => Ok(Frequency::Minutely),
            "SECONDLY" => Ok(Frequency::Secondly),
            other => Err(ScheduleError::InvalidRecurrence(format!(
                "unknown frequency '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed RRULE with its weekday and month-day selections resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    pub freq: Frequency,
    pub interval: u16,
    pub count: Option<u32>,
    pub until: Option<DateTime<Utc>>,
    pub weekdays: WeekDays,
    /// BYMONTHDAY values, sorted ascending
    pub monthdays: Vec<i8>,
}

impl Recurrence {
    pub fn new(freq: Frequency) -> Self {
        Recurrence {
            freq,
            interval: 1,
            count: None,
            until: None,
            weekdays: WeekDays::new(),
            monthdays: Vec::new(),
        }
    }

    /// Parse RRULE text such as `FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE`.
    ///
    /// A leading `RRULE:` is accepted. The text must also be accepted by the
    /// `rrule` crate, otherwise the occurrences could not be expanded later.
    pub fn parse(rule: &str) -> ScheduleResult<Self> {
        let rule = strip_rrule_prefix(rule);

        rule.parse::<RRule<Unvalidated>>()
            .map_err(|e| ScheduleError::InvalidRecurrence(format!("{}: {}", rule, e)))?;

        let freq = rule_part(rule, "FREQ")
            .next()
            .ok_or_else(|| ScheduleError::InvalidRecurrence(format!("{}: missing FREQ", rule)))?
            .parse::<Frequency>()?;

        let interval = match rule_part(rule, "INTERVAL").next() {
            Some(value) => value.parse::<u16>().map_err(|_| {
                ScheduleError::InvalidRecurrence(format!("{}: invalid INTERVAL", rule))
            })?,
            None => 1,
        };

        let count = rule_part(rule, "COUNT").next().and_then(|v| v.parse().ok());
        let until = rule_part(rule, "UNTIL").next().and_then(parse_until);

        let by_day: Vec<&str> = rule_part(rule, "BYDAY").collect();
        let weekdays = WeekDays::from_by_day(&by_day);

        let mut monthdays: Vec<i8> = rule_part(rule, "BYMONTHDAY")
            .filter_map(|v| v.parse().ok())
            .collect();
        monthdays.sort_unstable();
        monthdays.dedup();

        Ok(Recurrence {
            freq,
            interval,
            count,
            until,
            weekdays,
            monthdays,
        })
    }

    /// RRULE value text. BYDAY and BYMONTHDAY are only written when non-empty.
    pub fn to_rrule_string(&self) -> String {
        let mut parts = vec![
            format!("FREQ={}", self.freq),
            format!("INTERVAL={}", self.interval),
        ];

        if let Some(count) = self.count {
            parts.push(format!("COUNT={}", count));
        }
        if let Some(until) = self.until {
            parts.push(format!("UNTIL={}", until.format("%Y%m%dT%H%M%SZ")));
        }

        let by_day = self.weekdays.to_by_day();
        if !by_day.is_empty() {
            parts.push(format!("BYDAY={}", by_day.join(",")));
        }

        if !self.monthdays.is_empty() {
            let mut monthdays = self.monthdays.clone();
            monthdays.sort_unstable();
            let values: Vec<String> = monthdays.iter().map(|d| d.to_string()).collect();
            parts.push(format!("BYMONTHDAY={}", values.join(",")));
        }

        parts.join(";")
    }
}

impl fmt::Display for Recurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_rrule_string())
    }
}

fn strip_rrule_prefix(rule: &str) -> &str {
    let rule = rule.trim();
    rule.strip_prefix("RRULE:").unwrap_or(rule)
}

/// Comma-separated values of one `KEY=value` part of a rule.
fn rule_part<'a>(rule: &'a str, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    rule.split(';')
        .filter_map(|part| part.split_once('='))
        .filter(move |(k, _)| k.trim().eq_ignore_ascii_case(key))
        .flat_map(|(_, v)| v.split(','))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_until(value: &str) -> Option<DateTime<Utc>> {
    if let Some(utc) = value.strip_suffix('Z') {
        return NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
            .ok()
            .map(|dt| dt.and_utc());
    }
    NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y%m%d")
                .ok()
                .map(|d| d.and_time(chrono::NaiveTime::MIN))
        })
        .map(|dt| dt.and_utc())
}

/// Expand `rule` anchored at `dt_start` with the `rrule` crate.
///
/// A floating or date-only UNTIL is read as wall-clock time in the zone of
/// `dt_start`.
pub fn build_rrule_set(rule: &str, dt_start: DateTime<chrono_tz::Tz>) -> ScheduleResult<RRuleSet> {
    let rule = until_as_utc(strip_rrule_prefix(rule), &dt_start.timezone());
    let unvalidated: RRule<Unvalidated> = rule
        .parse()
        .map_err(|e| ScheduleError::InvalidRecurrence(format!("{}: {}", rule, e)))?;

    let tz = rrule::Tz::Tz(dt_start.timezone());
    unvalidated
        .build(dt_start.with_timezone(&tz))
        .map_err(|e| ScheduleError::InvalidRecurrence(format!("{}: {}", rule, e)))
}

/// Rewrite an UNTIL without `Z` into the UTC instant it names in `zone`.
/// `rrule` only accepts UTC bounds for zoned starts.
fn until_as_utc(rule: &str, zone: &chrono_tz::Tz) -> String {
    rule.split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value))
                if key.trim().eq_ignore_ascii_case("UNTIL") && !value.trim().ends_with('Z') =>
            {
                match parse_until(value.trim()) {
                    Some(until) => format!(
                        "UNTIL={}",
                        resolve_local(zone, until.naive_utc())
                            .with_timezone(&Utc)
                            .format("%Y%m%dT%H%M%SZ")
                    ),
                    None => part.to_string(),
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OccurrenceError {
    #[error("duplicate occurrence at {0}")]
    Duplicate(DateTime<Utc>),
}

impl OccurrenceError {
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            OccurrenceError::Duplicate(date) => *date,
        }
    }
}

/// Iterator adapter that reports an occurrence equal to the previous one as
/// [`OccurrenceError::Duplicate`].
pub struct DuplicateGuard<I, T: TimeZone> {
    inner: I,
    last: Option<DateTime<T>>,
}

impl<I, T> DuplicateGuard<I, T>
where
    I: Iterator<Item = DateTime<T>>,
    T: TimeZone,
{
    pub fn new(inner: I) -> Self {
        DuplicateGuard { inner, last: None }
    }
}

impl<I, T> Iterator for DuplicateGuard<I, T>
where
    I: Iterator<Item = DateTime<T>>,
    T: TimeZone,
{
    type Item = Result<DateTime<T>, OccurrenceError>;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.inner.next()?;
        if self.last.as_ref() == Some(&next) {
            return Some(Err(OccurrenceError::Duplicate(next.with_timezone(&Utc))));
        }
        self.last = Some(next.clone());
        Some(Ok(next))
    }
}

/// Iteration stopped because too many duplicates came in a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetriesExhausted {
    pub retries: u32,
    /// The occurrence that triggered the last failure
    pub date: DateTime<Utc>,
}

/// First occurrence at or after `now`.
///
/// Returns `Ok(None)` when the occurrences run out before `now`.
pub fn next_occurrence<I, T>(
    occurrences: I,
    now: DateTime<Utc>,
    max_retries: u32,
) -> Result<Option<DateTime<T>>, RetriesExhausted>
where
    I: IntoIterator<Item = Result<DateTime<T>, OccurrenceError>>,
    T: TimeZone,
{
    let mut retries = 0;

    for occurrence in occurrences {
        match occurrence {
            Ok(date) => {
                retries = 0;
                if date.with_timezone(&Utc) >= now {
                    return Ok(Some(date));
                }
            }
            Err(err) => {
                if retries >= max_retries {
                    return Err(RetriesExhausted {
                        retries,
                        date: err.date(),
                    });
                }
                retries += 1;
                tracing::debug!(error = %err, retries, "Skipping occurrence");
            }
        }
    }

    Ok(None)
}

/// Occurrences in `[now, until]` collected by [`occurrences_between`].
#[derive(Debug, Clone)]
pub struct OccurrenceWindow<T: TimeZone> {
    pub dates: Vec<DateTime<T>>,
    /// Set when iteration was cut short by repeated duplicates
    pub exhausted: Option<RetriesExhausted>,
}

/// All occurrences at or after `now` and not after `until`, ascending.
pub fn occurrences_between<I, T>(
    occurrences: I,
    now: DateTime<Utc>,
    until: DateTime<Utc>,
    max_retries: u32,
) -> OccurrenceWindow<T>
where
    I: IntoIterator<Item = Result<DateTime<T>, OccurrenceError>>,
    T: TimeZone,
{
    let mut dates = Vec::new();
    let mut retries = 0;

    for occurrence in occurrences {
        match occurrence {
            Ok(date) => {
                retries = 0;
                let instant = date.with_timezone(&Utc);
                if instant > until {
                    break;
                }
                if instant >= now {
                    dates.push(date);
                }
            }
            Err(err) => {
                if retries >= max_retries {
                    return OccurrenceWindow {
                        dates,
                        exhausted: Some(RetriesExhausted {
                            retries,
                            date: err.date(),
                        }),
                    };
                }
                retries += 1;
                tracing::debug!(error = %err, retries, "Skipping occurrence");
            }
        }
    }

    OccurrenceWindow {
        dates,
        exhausted: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weekdays::{DaySelection, WeekDay};
    use std::cell::Cell;

    fn utc(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn parse_resolves_weekdays_and_monthdays() {
        let recurrence = Recurrence::parse("FREQ=MONTHLY;INTERVAL=2;BYMONTHDAY=15,1;BYDAY=2TU")
            .expect("Should parse");

        assert_eq!(recurrence.freq, Frequency::Monthly);
        assert_eq!(recurrence.interval, 2);
        assert_eq!(recurrence.monthdays, vec![1, 15]);
        assert_eq!(recurrence.weekdays.get(WeekDay::Tuesday), DaySelection::Nth(2));
    }

    #[test]
    fn parse_accepts_rrule_prefix_and_defaults_interval() {
        let recurrence = Recurrence::parse("RRULE:FREQ=DAILY;COUNT=3").expect("Should parse");

        assert_eq!(recurrence.freq, Frequency::Daily);
        assert_eq!(recurrence.interval, 1);
        assert_eq!(recurrence.count, Some(3));
        assert!(recurrence.weekdays.is_default());
    }

    #[test]
    fn parse_reads_until() {
        let recurrence =
            Recurrence::parse("FREQ=WEEKLY;UNTIL=20240301T000000Z").expect("Should parse");
        assert_eq!(recurrence.until, Some(utc(2024, 3, 1, 0)));
    }

    #[test]
    fn parse_rejects_unknown_frequency() {
        assert!(Recurrence::parse("FREQ=FORTNIGHTLY").is_err());
        assert!(Recurrence::parse("INTERVAL=2").is_err());
    }

    #[test]
    fn rrule_string_skips_empty_parts() {
        let recurrence = Recurrence::new(Frequency::Weekly);
        assert_eq!(recurrence.to_rrule_string(), "FREQ=WEEKLY;INTERVAL=1");

        let recurrence = Recurrence {
            weekdays: WeekDays::from_by_day(&["FR", "MO"]),
            monthdays: vec![20, 3],
            ..Recurrence::new(Frequency::Monthly)
        };
        assert_eq!(
            recurrence.to_rrule_string(),
            "FREQ=MONTHLY;INTERVAL=1;BYDAY=MO,FR;BYMONTHDAY=3,20"
        );
    }

    #[test]
    fn duplicate_guard_flags_repeated_instants() {
        let dates = vec![utc(2024, 1, 1, 0), utc(2024, 1, 1, 0), utc(2024, 1, 2, 0)];
        let results: Vec<_> = DuplicateGuard::new(dates.into_iter()).collect();

        assert_eq!(results[0], Ok(utc(2024, 1, 1, 0)));
        assert_eq!(results[1], Err(OccurrenceError::Duplicate(utc(2024, 1, 1, 0))));
        assert_eq!(results[2], Ok(utc(2024, 1, 2, 0)));
    }

    #[test]
    fn next_occurrence_skips_past_dates() {
        let dates = vec![utc(2024, 1, 1, 0), utc(2024, 1, 8, 0), utc(2024, 1, 15, 0)];
        let next = next_occurrence(DuplicateGuard::new(dates.into_iter()), utc(2024, 1, 8, 0), 5);

        assert_eq!(next, Ok(Some(utc(2024, 1, 8, 0))));
    }

    #[test]
    fn next_occurrence_tolerates_some_duplicates() {
        let dates = vec![
            utc(2024, 1, 1, 0),
            utc(2024, 1, 1, 0),
            utc(2024, 1, 1, 0),
            utc(2024, 1, 2, 0),
        ];
        let next = next_occurrence(DuplicateGuard::new(dates.into_iter()), utc(2024, 1, 2, 0), 5);

        assert_eq!(next, Ok(Some(utc(2024, 1, 2, 0))));
    }

    #[test]
    fn next_occurrence_gives_up_after_max_retries() {
        let calls = Cell::new(0u32);
        let failing = std::iter::repeat_with(|| {
            calls.set(calls.get() + 1);
            Err::<DateTime<Utc>, _>(OccurrenceError::Duplicate(utc(2024, 1, 31, 0)))
        });

        let result = next_occurrence(failing, utc(2024, 1, 1, 0), DEFAULT_MAX_DUPLICATE_RETRIES);

        let exhausted = result.expect_err("Should give up");
        assert_eq!(exhausted.retries, DEFAULT_MAX_DUPLICATE_RETRIES);
        assert_eq!(exhausted.date, utc(2024, 1, 31, 0));
        // the first attempt plus five retries
        assert_eq!(calls.get(), DEFAULT_MAX_DUPLICATE_RETRIES + 1);
    }

    #[test]
    fn next_occurrence_returns_none_when_exhausted() {
        let dates = vec![utc(2024, 1, 1, 0)];
        let next = next_occurrence(DuplicateGuard::new(dates.into_iter()), utc(2025, 1, 1, 0), 5);
        assert_eq!(next, Ok(None));
    }

    #[test]
    fn occurrences_between_respects_both_bounds() {
        let dates: Vec<_> = (1..=20).map(|d| utc(2024, 1, d, 0)).collect();
        let window = occurrences_between(
            DuplicateGuard::new(dates.into_iter()),
            utc(2024, 1, 5, 0),
            utc(2024, 1, 10, 0),
            5,
        );

        assert!(window.exhausted.is_none());
        assert_eq!(window.dates.first(), Some(&utc(2024, 1, 5, 0)));
        assert_eq!(window.dates.last(), Some(&utc(2024, 1, 10, 0)));
        assert_eq!(window.dates.len(), 6);
    }

    #[test]
    fn floating_until_is_read_in_the_start_zone() {
        let rule = until_as_utc("FREQ=DAILY;UNTIL=20240105T100000", &chrono_tz::Europe::Berlin);
        assert_eq!(rule, "FREQ=DAILY;UNTIL=20240105T090000Z");

        let rule = until_as_utc("FREQ=DAILY;UNTIL=20240105", &chrono_tz::Europe::Berlin);
        assert_eq!(rule, "FREQ=DAILY;UNTIL=20240104T230000Z");

        let rule = until_as_utc("FREQ=DAILY;UNTIL=20240105T100000Z", &chrono_tz::Europe::Berlin);
        assert_eq!(rule, "FREQ=DAILY;UNTIL=20240105T100000Z");
    }

    #[test]
    fn build_rrule_set_accepts_floating_until() {
        let start = chrono_tz::Europe::Berlin
            .with_ymd_and_hms(2024, 1, 1, 10, 0, 0)
            .unwrap();
        let set = build_rrule_set("FREQ=DAILY;UNTIL=20240103T100000", start).expect("Should build");

        assert_eq!(set.into_iter().count(), 3);
    }

    #[test]
    fn build_rrule_set_expands_weekly_rule() {
        let start = chrono_tz::UTC.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let set = build_rrule_set("FREQ=WEEKLY;BYDAY=MO,WE;COUNT=4", start).expect("Should build");

        let dates: Vec<DateTime<Utc>> = set.into_iter().map(|d| d.with_timezone(&Utc)).collect();
        assert_eq!(
            dates,
            vec![
                Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 8, 10, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 1, 10, 10, 0, 0).unwrap(),
            ]
        );
    }
}
