//! ICS parsing using the icalendar crate's parser.

use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Property, read_calendar, unfold},
};

use super::VEvent;
use crate::duration::EventDuration;
use crate::error::{ScheduleError, ScheduleResult};
use crate::event_time::EventTime;

/// Parse the first VEVENT of a VCALENDAR text blob.
pub fn parse_vevent(content: &str) -> ScheduleResult<VEvent> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).map_err(|e| ScheduleError::IcsParse(e.to_string()))?;
    let vevent = calendar
        .components
        .iter()
        .find(|c| c.name == "VEVENT")
        .ok_or(ScheduleError::MissingEvent)?;

    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.as_ref().to_string())
        .unwrap_or_default();
    let summary = vevent.find_prop("SUMMARY").map(|p| p.val.as_ref().to_string());
    let description = vevent.find_prop("DESCRIPTION").map(|p| p.val.as_ref().to_string());

    let start = vevent.find_prop("DTSTART").map(parse_event_time).transpose()?;
    let end = vevent.find_prop("DTEND").map(parse_event_time).transpose()?;
    let duration = vevent
        .find_prop("DURATION")
        .map(|p| p.val.as_ref().parse::<EventDuration>())
        .transpose()?;

    let rrule = vevent.find_prop("RRULE").map(|p| p.val.as_ref().to_string());

    Ok(VEvent {
        uid,
        summary,
        description,
        start,
        end,
        duration,
        rrule,
    })
}

fn parse_event_time(prop: &Property) -> ScheduleResult<EventTime> {
    let dpt = DatePerhapsTime::try_from(prop).map_err(|_| {
        ScheduleError::IcsParse(format!("invalid {} value '{}'", prop.name.as_ref(), prop.val.as_ref()))
    })?;
    Ok(to_event_time(dpt))
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving timezone info
fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => EventTime::DateTimeZoned {
                datetime: date_time,
                tzid,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};

    #[test]
    fn test_parse_recurring_event() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:schedule-123
SUMMARY:Weekly scan
DTSTART:20240101T100000Z
DURATION:PT1H
RRULE:FREQ=WEEKLY;BYDAY=MO,WE
END:VEVENT
END:VCALENDAR"#;

        let vevent = parse_vevent(ics).expect("Should parse");

        assert_eq!(vevent.uid, "schedule-123");
        assert_eq!(vevent.summary.as_deref(), Some("Weekly scan"));
        assert_eq!(
            vevent.start,
            Some(EventTime::DateTimeUtc(
                Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
            ))
        );
        assert_eq!(vevent.duration.map(|d| d.as_seconds()), Some(3600));
        assert_eq!(vevent.rrule.as_deref(), Some("FREQ=WEEKLY;BYDAY=MO,WE"));
        assert!(vevent.end.is_none());
    }

    #[test]
    fn test_parse_preserves_tzid() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:zoned\r\n\
DTSTART;TZID=Europe/Berlin:20240101T100000\r\n\
DTEND;TZID=Europe/Berlin:20240101T113000\r\n\
END:VEVENT\r\n\
END:VCALENDAR";

        let vevent = parse_vevent(ics).expect("Should parse");

        match vevent.start {
            Some(EventTime::DateTimeZoned { ref tzid, datetime }) => {
                assert_eq!(tzid, "Europe/Berlin");
                assert_eq!(
                    datetime,
                    NaiveDate::from_ymd_opt(2024, 1, 1)
                        .unwrap()
                        .and_hms_opt(10, 0, 0)
                        .unwrap()
                );
            }
            other => panic!("Expected DateTimeZoned, got {:?}", other),
        }
        assert!(matches!(vevent.end, Some(EventTime::DateTimeZoned { .. })));
    }

    #[test]
    fn test_parse_floating_and_all_day() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:floating
DTSTART:20240101T100000
END:VEVENT
END:VCALENDAR"#;
        let vevent = parse_vevent(ics).expect("Should parse");
        assert!(matches!(vevent.start, Some(EventTime::DateTimeFloating(_))));

        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VEVENT
UID:all-day
DTSTART;VALUE=DATE:20240101
END:VEVENT
END:VCALENDAR"#;
        let vevent = parse_vevent(ics).expect("Should parse");
        assert_eq!(
            vevent.start,
            Some(EventTime::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()))
        );
    }

    #[test]
    fn test_parse_without_vevent_fails() {
        let ics = r#"BEGIN:VCALENDAR
VERSION:2.0
PRODID:TEST
BEGIN:VTODO
UID:todo
END:VTODO
END:VCALENDAR"#;

        assert!(matches!(parse_vevent(ics), Err(ScheduleError::MissingEvent)));
    }

    #[test]
    fn test_parse_garbage_fails() {
        assert!(parse_vevent("this is not a calendar").is_err());
    }

    #[test]
    fn test_parse_line_folding() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:TEST\r\n\
BEGIN:VEVENT\r\n\
UID:folded\r\n\
DTSTART:20240101T100000Z\r\n\
DESCRIPTION:Scan all \r\n hosts in the \r\n DMZ\r\n\
END:VEVENT\r\n\
END:VCALENDAR";

        let vevent = parse_vevent(ics).expect("Should parse");
        assert_eq!(vevent.description.as_deref(), Some("Scan all hosts in the DMZ"));
    }
}
