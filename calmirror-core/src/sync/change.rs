use std::fmt;

use serde::{Deserialize, Serialize};

use crate::calendar::CalendarEvent;
use crate::event::EventTime;
use crate::fingerprint::Fingerprint;

/// The only two writes reconciliation performs on a child calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    Create,
    Delete,
}

impl ChangeKind {
    pub fn symbol(&self) -> &'static str {
        match self {
            ChangeKind::Create => "+",
            ChangeKind::Delete => "-",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// A write reconciliation would make to one child calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedChange {
    pub kind: ChangeKind,
    pub fingerprint: Fingerprint,
    pub summary: String,
    pub start: EventTime,
    /// Parent calendar the event is mirrored from (creates only).
    pub source: Option<String>,
}

impl PlannedChange {
    pub(crate) fn create(event: &impl CalendarEvent, fingerprint: &Fingerprint, source: &str) -> Self {
        PlannedChange {
            kind: ChangeKind::Create,
            fingerprint: fingerprint.clone(),
            summary: event.title().to_string(),
            start: event.raw().start.clone(),
            source: Some(source.to_string()),
        }
    }

    pub(crate) fn delete(event: &impl CalendarEvent, fingerprint: &Fingerprint) -> Self {
        PlannedChange {
            kind: ChangeKind::Delete,
            fingerprint: fingerprint.clone(),
            summary: event.title().to_string(),
            start: event.raw().start.clone(),
            source: None,
        }
    }
}

impl fmt::Display for PlannedChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} [{}]", self.kind, self.summary, self.fingerprint)
    }
}
