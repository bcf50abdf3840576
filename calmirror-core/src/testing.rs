//! In-memory provider and record builders for tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Duration};

use crate::date_range::SyncDateRange;
use crate::error::{MirrorError, MirrorResult};
use crate::event::{EventPayload, EventTime, RawEvent};
use crate::provider::CalendarProvider;

static NEXT_UID: AtomicUsize = AtomicUsize::new(1);

fn next_uid() -> String {
    format!("uid-{}", NEXT_UID.fetch_add(1, Ordering::Relaxed))
}

/// A timed one-hour record with a fresh uid.
pub fn record(summary: &str) -> RawEvent {
    let start = DateTime::parse_from_rfc3339("2025-03-20T15:00:00+01:00").unwrap();
    RawEvent {
        summary: summary.to_string(),
        description: None,
        location: None,
        start: EventTime::DateTime(start),
        end: EventTime::DateTime(start + Duration::hours(1)),
        uid: next_uid(),
        rrule: None,
        recurrence_id: None,
    }
}

/// A child record that looks like an earlier mirror carrying `token`.
pub fn child_record(summary: &str, token: &str) -> RawEvent {
    RawEvent {
        description: Some(format!("[{}]", token)),
        ..record(summary)
    }
}

/// Calendars keyed by entity id. Ignores the date window.
#[derive(Default)]
pub struct MemoryProvider {
    calendars: Mutex<HashMap<String, Vec<RawEvent>>>,
    created: Mutex<Vec<(String, EventPayload)>>,
    deleted: Mutex<Vec<(String, String)>>,
    failure: Mutex<Option<String>>,
    description_override: Mutex<Option<String>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_calendar(&self, entity_id: &str) {
        self.calendars
            .lock()
            .unwrap()
            .entry(entity_id.to_string())
            .or_default();
    }

    pub fn insert(&self, entity_id: &str, event: RawEvent) {
        self.calendars
            .lock()
            .unwrap()
            .entry(entity_id.to_string())
            .or_default()
            .push(event);
    }

    /// Replace the stored record with uid `uid`.
    pub fn replace(&self, entity_id: &str, uid: &str, event: RawEvent) {
        let mut calendars = self.calendars.lock().unwrap();
        let events = calendars.get_mut(entity_id).unwrap();
        let slot = events.iter_mut().find(|e| e.uid == uid).unwrap();
        *slot = event;
    }

    pub fn remove(&self, entity_id: &str, uid: &str) {
        let mut calendars = self.calendars.lock().unwrap();
        calendars.get_mut(entity_id).unwrap().retain(|e| e.uid != uid);
    }

    pub fn events(&self, entity_id: &str) -> Vec<RawEvent> {
        self.calendars
            .lock()
            .unwrap()
            .get(entity_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Make every following call fail with a provider error.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    /// Store created events with this description instead of the requested
    /// one, like a backend that rewrites the field. `None` stops rewriting.
    pub fn rewrite_descriptions(&self, description: Option<&str>) {
        *self.description_override.lock().unwrap() = description.map(String::from);
    }

    pub fn created(&self) -> Vec<(String, EventPayload)> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn reset_counters(&self) {
        self.created.lock().unwrap().clear();
        self.deleted.lock().unwrap().clear();
    }

    fn check_failure(&self) -> MirrorResult<()> {
        match self.failure.lock().unwrap().as_ref() {
            Some(message) => Err(MirrorError::Provider(message.clone())),
            None => Ok(()),
        }
    }
}

impl CalendarProvider for MemoryProvider {
    async fn list_events(
        &self,
        entity_id: &str,
        _range: &SyncDateRange,
    ) -> MirrorResult<Vec<RawEvent>> {
        self.check_failure()?;
        self.calendars
            .lock()
            .unwrap()
            .get(entity_id)
            .cloned()
            .ok_or_else(|| MirrorError::CalendarNotFound(entity_id.to_string()))
    }

    async fn create_event(
        &self,
        entity_id: &str,
        payload: &EventPayload,
    ) -> MirrorResult<RawEvent> {
        self.check_failure()?;
        let mut calendars = self.calendars.lock().unwrap();
        let events = calendars
            .get_mut(entity_id)
            .ok_or_else(|| MirrorError::CalendarNotFound(entity_id.to_string()))?;

        let mut created = payload.clone().into_raw(next_uid());
        if let Some(description) = self.description_override.lock().unwrap().clone() {
            created.description = Some(description);
        }
        events.push(created.clone());
        self.created
            .lock()
            .unwrap()
            .push((entity_id.to_string(), payload.clone()));
        Ok(created)
    }

    async fn delete_event(&self, entity_id: &str, uid: &str) -> MirrorResult<()> {
        self.check_failure()?;
        let mut calendars = self.calendars.lock().unwrap();
        let events = calendars
            .get_mut(entity_id)
            .ok_or_else(|| MirrorError::CalendarNotFound(entity_id.to_string()))?;

        events.retain(|e| e.uid != uid);
        self.deleted
            .lock()
            .unwrap()
            .push((entity_id.to_string(), uid.to_string()));
        Ok(())
    }
}
