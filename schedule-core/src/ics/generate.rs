//! ICS generation.

use icalendar::{Calendar, Component, EventLike, Property, ValueType};

use super::VEvent;
use crate::event_time::EventTime;

/// Product identifier stamped on every generated calendar.
pub const PRODUCT_ID: &str = "-//Greenbone.net//NONSGML Greenbone Security Assistent";

/// Generate a standalone VCALENDAR holding exactly this VEVENT.
pub fn generate_ics(vevent: &VEvent) -> String {
    let mut cal = Calendar::new();

    let mut ics_event = icalendar::Event::new();
    if !vevent.uid.is_empty() {
        ics_event.uid(&vevent.uid);
    }

    if let Some(ref summary) = vevent.summary {
        ics_event.summary(summary);
    }

    if let Some(ref desc) = vevent.description {
        ics_event.description(desc);
    }

    if let Some(ref start) = vevent.start {
        add_datetime_property(&mut ics_event, "DTSTART", start);
    }

    // DTEND and DURATION are mutually exclusive (RFC 5545 3.6.1)
    if let Some(ref end) = vevent.end {
        add_datetime_property(&mut ics_event, "DTEND", end);
    } else if let Some(duration) = vevent.duration {
        ics_event.add_property("DURATION", duration.to_string());
    }

    if let Some(ref rrule) = vevent.rrule {
        ics_event.add_property("RRULE", rrule);
    }

    cal.push(ics_event.done());
    let cal = cal.done();

    restamp_calendar(&cal.to_string())
}

/// Clean up ICS output from the icalendar crate
/// - Replace PRODID with ours
/// - Remove CALSCALE:GREGORIAN (it's the default)
fn restamp_calendar(ics: &str) -> String {
    let mut result = String::with_capacity(ics.len());

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str("PRODID:");
            result.push_str(PRODUCT_ID);
            result.push_str("\r\n");
            continue;
        }

        if line == "CALSCALE:GREGORIAN" {
            continue;
        }

        result.push_str(line);
        result.push_str("\r\n");
    }

    result
}

/// Add a datetime property with proper formatting based on EventTime variant
fn add_datetime_property(ics_event: &mut icalendar::Event, name: &str, time: &EventTime) {
    match time {
        EventTime::Date(d) => {
            let mut prop = Property::new(name, d.format("%Y%m%d").to_string());
            prop.append_parameter(ValueType::Date);
            ics_event.append_property(prop);
        }
        EventTime::DateTimeUtc(dt) => {
            ics_event.add_property(name, dt.format("%Y%m%dT%H%M%SZ").to_string());
        }
        EventTime::DateTimeFloating(dt) => {
            ics_event.add_property(name, dt.format("%Y%m%dT%H%M%S").to_string());
        }
        EventTime::DateTimeZoned { datetime, tzid } => {
            let mut prop = Property::new(name, datetime.format("%Y%m%dT%H%M%S").to_string());
            prop.add_parameter("TZID", tzid);
            ics_event.append_property(prop);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::EventDuration;
    use crate::ics::parse_vevent;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn make_test_vevent() -> VEvent {
        VEvent {
            uid: "test-schedule-123".to_string(),
            summary: Some("Nightly scan".to_string()),
            description: None,
            start: Some(EventTime::DateTimeUtc(
                Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap(),
            )),
            end: None,
            duration: None,
            rrule: None,
        }
    }

    #[test]
    fn test_generate_ics_stamps_product_and_version() {
        let ics = generate_ics(&make_test_vevent());

        assert!(ics.starts_with("BEGIN:VCALENDAR"), "ICS:\n{}", ics);
        assert!(
            ics.lines().any(|l| l == format!("PRODID:{}", PRODUCT_ID)),
            "Should carry our PRODID. ICS:\n{}",
            ics
        );
        assert!(ics.lines().any(|l| l == "VERSION:2.0"), "ICS:\n{}", ics);
        assert!(!ics.contains("CALSCALE"), "ICS:\n{}", ics);
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 1);
    }

    #[test]
    fn test_generate_ics_writes_rrule_and_duration() {
        let mut vevent = make_test_vevent();
        vevent.rrule = Some("FREQ=WEEKLY;INTERVAL=1;BYDAY=MO,WE".to_string());
        vevent.duration = Some(EventDuration::from_seconds(5400));

        let ics = generate_ics(&vevent);

        assert!(ics.contains("RRULE:FREQ=WEEKLY;INTERVAL=1;BYDAY=MO,WE"), "ICS:\n{}", ics);
        assert!(ics.contains("DURATION:PT1H30M"), "ICS:\n{}", ics);
        assert!(ics.contains("DTSTART:20250320T150000Z"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_prefers_dtend_over_duration() {
        let mut vevent = make_test_vevent();
        vevent.end = Some(EventTime::DateTimeUtc(
            Utc.with_ymd_and_hms(2025, 3, 20, 16, 0, 0).unwrap(),
        ));
        vevent.duration = Some(EventDuration::from_seconds(60));

        let ics = generate_ics(&vevent);

        assert!(ics.contains("DTEND:20250320T160000Z"), "ICS:\n{}", ics);
        assert!(!ics.contains("DURATION"), "ICS:\n{}", ics);
    }

    #[test]
    fn test_generate_ics_all_day_event_has_value_date() {
        let mut vevent = make_test_vevent();
        vevent.start = Some(EventTime::Date(NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()));

        let ics = generate_ics(&vevent);

        assert!(
            ics.contains("DTSTART;VALUE=DATE:20250320"),
            "DTSTART should have VALUE=DATE parameter. ICS:\n{}",
            ics
        );
    }

    #[test]
    fn test_generate_and_parse_roundtrip_keeps_tzid() {
        let mut vevent = make_test_vevent();
        vevent.start = Some(EventTime::DateTimeZoned {
            datetime: NaiveDate::from_ymd_opt(2025, 3, 20)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            tzid: "Europe/Berlin".to_string(),
        });
        vevent.rrule = Some("FREQ=DAILY;INTERVAL=2".to_string());

        let ics = generate_ics(&vevent);
        let parsed = parse_vevent(&ics).expect("Should parse generated ICS");

        assert_eq!(parsed.uid, vevent.uid);
        assert_eq!(parsed.start, vevent.start);
        assert_eq!(parsed.rrule, vevent.rrule);
        assert_eq!(parsed.summary, vevent.summary);
    }
}
