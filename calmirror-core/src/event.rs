//! Provider-neutral event records.
//!
//! Providers return `RawEvent`s from `list_events` and accept `EventPayload`s
//! in `create_event`. The parent/child split lives in `calendar::event`.

use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// One calendar occurrence as reported by a provider.
///
/// The serialized form of this struct is the input of the parent
/// fingerprint, so field order is part of the identity scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub uid: String,
    #[serde(default)]
    pub rrule: Option<String>,
    #[serde(default)]
    pub recurrence_id: Option<String>,
}

impl RawEvent {
    /// All-day events carry dates without a time-of-day component.
    pub fn is_all_day(&self) -> bool {
        matches!(self.start, EventTime::Date(_))
    }
}

impl fmt::Display for RawEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary)
    }
}

/// Fields sent to a provider to create a new event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
}

impl EventPayload {
    /// Materialize the record a provider would store for this payload.
    pub fn into_raw(self, uid: String) -> RawEvent {
        RawEvent {
            summary: self.summary,
            description: self.description,
            location: self.location,
            start: self.start,
            end: self.end,
            uid,
            rrule: None,
            recurrence_id: None,
        }
    }
}

/// Start or end of an event: a date for all-day events, otherwise a date-time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTime {
    Date(NaiveDate),
    DateTime(DateTime<FixedOffset>),
}

impl EventTime {
    /// Instant this time begins at, treating dates as midnight UTC.
    pub fn to_utc(&self) -> Option<DateTime<chrono::Utc>> {
        match self {
            EventTime::Date(d) => d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()),
            EventTime::DateTime(dt) => Some(dt.to_utc()),
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTime(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
        }
    }
}
