//! Schedule elements as delivered by the management service.
//!
//! The element is XML converted to JSON: attributes are `_`-prefixed keys,
//! text nodes may be plain strings or `{"__text": ...}` objects, and a list
//! with one entry arrives as a single object. Decoding never fails; missing
//! or malformed fields fall back to defaults.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::Value;

use crate::event::Event;

/// A task that runs on a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskRef {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct Schedule {
    pub id: String,
    pub name: String,
    pub comment: Option<String>,
    pub timezone: Option<String>,
    pub icalendar: Option<String>,
    /// None when `icalendar` is missing or could not be parsed
    pub event: Option<Event>,
    pub tasks: Vec<TaskRef>,
}

impl Schedule {
    pub fn from_element(element: &Value) -> Self {
        let id = element.get("_id").and_then(text).unwrap_or_default();
        let timezone = element.get("timezone").and_then(text).filter(|tz| !tz.is_empty());
        let icalendar = element
            .get("icalendar")
            .and_then(text)
            .filter(|ical| !ical.trim().is_empty());

        let event = icalendar.as_deref().and_then(|ical| {
            match Event::from_ical(ical, timezone.as_deref()) {
                Ok(event) => Some(event),
                Err(err) => {
                    tracing::warn!(schedule = %id, error = %err, "Ignoring unreadable icalendar");
                    None
                }
            }
        });

        let tasks = element
            .get("tasks")
            .and_then(|tasks| tasks.get("task"))
            .map(one_or_many)
            .unwrap_or_default()
            .into_iter()
            .map(|task| TaskRef {
                id: task.get("_id").and_then(text).unwrap_or_default(),
                name: task.get("name").and_then(text).unwrap_or_default(),
            })
            .collect();

        Schedule {
            id,
            name: element.get("name").and_then(text).unwrap_or_default(),
            comment: element.get("comment").and_then(text).filter(|c| !c.is_empty()),
            timezone,
            icalendar,
            event,
            tasks,
        }
    }

    pub fn is_in_use(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn next_date(&self) -> Option<DateTime<Tz>> {
        self.event.as_ref()?.next_date()
    }

    pub fn next_date_at(&self, now: DateTime<Utc>) -> Option<DateTime<Tz>> {
        self.event.as_ref()?.next_date_at(now)
    }
}

/// Text content of a node: a plain value or an `{"__text": ...}` wrapper.
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get("__text").and_then(text),
        Value::Null | Value::Array(_) => None,
    }
}

fn one_or_many(value: &Value) -> Vec<&Value> {
    match value {
        Value::Array(items) => items.iter().collect(),
        Value::Null => Vec::new(),
        other => vec![other],
    }
}
