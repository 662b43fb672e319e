//! Recurring schedule model.
//!
//! Schedules are stored as a single iCalendar VEVENT plus a timezone. This
//! crate provides:
//! - `WeekDays` for BYDAY weekday selections
//! - `Event` for reading, building and serializing schedule events and
//!   computing their next runs
//! - `Schedule` for decoding schedule elements from the management service
//! - `config` and `logging` for the ambient setup shared with the CLI

pub mod config;
pub mod duration;
pub mod error;
pub mod event;
pub mod event_time;
pub mod ics;
pub mod logging;
pub mod recurrence;
pub mod schedule;
pub mod weekdays;

pub use duration::EventDuration;
pub use error::{ScheduleError, ScheduleResult};
pub use event::{Event, EventData};
pub use event_time::EventTime;
pub use recurrence::{Frequency, Recurrence};
pub use schedule::{Schedule, TaskRef};
pub use weekdays::{DaySelection, WeekDay, WeekDays};
