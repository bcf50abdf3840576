//! Parent and child event variants.
//!
//! The variants differ only in how a fingerprint is obtained: parents hash
//! their own record, children read the token embedded in their description.

use crate::event::{EventPayload, RawEvent};
use crate::fingerprint::{Fingerprint, FingerprintScheme};

/// An event held by a calendar snapshot.
pub trait CalendarEvent {
    fn from_raw(raw: RawEvent, scheme: &FingerprintScheme) -> Self;

    fn raw(&self) -> &RawEvent;

    /// Identity used by reconciliation. `None` for events this tool never created.
    fn fingerprint(&self) -> Option<&Fingerprint>;

    fn title(&self) -> &str {
        &self.raw().summary
    }
}

/// An event read from a parent calendar.
#[derive(Debug, Clone)]
pub struct ParentEvent {
    raw: RawEvent,
    fingerprint: Fingerprint,
}

impl ParentEvent {
    /// Parent fingerprints are always present.
    pub fn id(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Payload for the mirrored copy: same times, title and location, with
    /// the fingerprint token appended to the description.
    pub fn mirror_payload(&self, scheme: &FingerprintScheme) -> EventPayload {
        EventPayload {
            summary: self.raw.summary.clone(),
            description: Some(scheme.embed(self.raw.description.as_deref(), &self.fingerprint)),
            location: self.raw.location.clone(),
            start: self.raw.start.clone(),
            end: self.raw.end.clone(),
        }
    }
}

impl CalendarEvent for ParentEvent {
    fn from_raw(raw: RawEvent, scheme: &FingerprintScheme) -> Self {
        let fingerprint = scheme.compute(&raw);
        ParentEvent { raw, fingerprint }
    }

    fn raw(&self) -> &RawEvent {
        &self.raw
    }

    fn fingerprint(&self) -> Option<&Fingerprint> {
        Some(&self.fingerprint)
    }
}

/// An event read from (or just written to) a child calendar.
#[derive(Debug, Clone)]
pub struct ChildEvent {
    raw: RawEvent,
    fingerprint: Option<Fingerprint>,
}

impl CalendarEvent for ChildEvent {
    fn from_raw(raw: RawEvent, scheme: &FingerprintScheme) -> Self {
        let fingerprint = scheme.extract(raw.description.as_deref());
        ChildEvent { raw, fingerprint }
    }

    fn raw(&self) -> &RawEvent {
        &self.raw
    }

    fn fingerprint(&self) -> Option<&Fingerprint> {
        self.fingerprint.as_ref()
    }
}
