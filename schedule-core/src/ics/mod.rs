//! ICS parsing and generation.
//!
//! This module handles reading and writing the single-VEVENT calendars that
//! schedules are stored as (RFC 5545).

mod generate;
mod parse;

pub use generate::{PRODUCT_ID, generate_ics};
pub use parse::parse_vevent;

use crate::duration::EventDuration;
use crate::event_time::EventTime;

/// The properties of one VEVENT that the schedule model reads and writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VEvent {
    pub uid: String,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub start: Option<EventTime>,
    pub end: Option<EventTime>,
    pub duration: Option<EventDuration>,
    /// RRULE value text, without the `RRULE:` name
    pub rrule: Option<String>,
}
