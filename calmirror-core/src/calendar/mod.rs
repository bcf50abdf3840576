//! Point-in-time calendar snapshots.
//!
//! A snapshot is loaded once per run for a fixed date window. After that it
//! only changes to mirror writes this process made, so lookups later in the
//! same run see events created or deleted earlier in it.

mod event;
mod selection;

pub use event::{CalendarEvent, ChildEvent, ParentEvent};
pub use selection::KeywordMatcher;

use std::collections::{HashMap, HashSet};
use std::fmt;

use tracing::{debug, error};

use crate::date_range::SyncDateRange;
use crate::error::{MirrorError, MirrorResult};
use crate::fingerprint::{Fingerprint, FingerprintScheme};
use crate::provider::CalendarProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalendarKind {
    Parent,
    Child,
}

impl fmt::Display for CalendarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalendarKind::Parent => write!(f, "parent"),
            CalendarKind::Child => write!(f, "child"),
        }
    }
}

/// Events of one calendar plus an index from fingerprint to event.
#[derive(Debug)]
pub struct Calendar<E> {
    entity_id: String,
    range: SyncDateRange,
    scheme: FingerprintScheme,
    events: Vec<E>,
    index: HashMap<Fingerprint, usize>,
    resolved: bool,
}

impl<E: CalendarEvent> Calendar<E> {
    pub fn new(entity_id: &str, range: SyncDateRange, scheme: FingerprintScheme) -> Self {
        Calendar {
            entity_id: entity_id.to_string(),
            range,
            scheme,
            events: Vec::new(),
            index: HashMap::new(),
            resolved: true,
        }
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn scheme(&self) -> &FingerprintScheme {
        &self.scheme
    }

    pub fn events(&self) -> &[E] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// False after a load the provider could not resolve.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    /// Fetch the window's events from the provider.
    ///
    /// A calendar the provider cannot resolve is logged and left empty, so it
    /// contributes nothing to either side of the diff.
    async fn load<P: CalendarProvider>(&mut self, provider: &P) -> MirrorResult<()> {
        match provider.list_events(&self.entity_id, &self.range).await {
            Ok(records) => {
                self.resolved = true;
                self.events = records
                    .into_iter()
                    .map(|raw| E::from_raw(raw, &self.scheme))
                    .collect();
            }
            Err(MirrorError::CalendarNotFound(_)) => {
                error!(entity_id = %self.entity_id, "Could not load calendar");
                self.resolved = false;
                self.events.clear();
            }
            Err(e) => return Err(e),
        }

        self.reindex();
        Ok(())
    }

    /// Rebuild the index. Later events win on fingerprint collisions.
    fn reindex(&mut self) {
        self.index = self
            .events
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.fingerprint().map(|fp| (fp.clone(), i)))
            .collect();
    }

    fn push(&mut self, event: E) {
        if let Some(fp) = event.fingerprint() {
            self.index.insert(fp.clone(), self.events.len());
        }
        self.events.push(event);
    }

    fn retain(&mut self, keep: impl FnMut(&E) -> bool) {
        self.events.retain(keep);
        self.reindex();
    }

    fn remove(&mut self, fingerprint: &Fingerprint) -> Option<E> {
        let position = self.index.get(fingerprint).copied()?;
        let removed = self.events.remove(position);
        self.reindex();
        Some(removed)
    }

    pub fn has_event(&self, fingerprint: &Fingerprint) -> bool {
        self.index.contains_key(fingerprint)
    }

    pub fn event_for(&self, fingerprint: &Fingerprint) -> Option<&E> {
        self.index.get(fingerprint).map(|&i| &self.events[i])
    }

    pub fn fingerprints(&self) -> HashSet<Fingerprint> {
        self.index.keys().cloned().collect()
    }
}

impl<E> fmt::Display for Calendar<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.entity_id)
    }
}

/// A calendar events are mirrored from.
#[derive(Debug)]
pub struct ParentCalendar {
    calendar: Calendar<ParentEvent>,
    ignore_prefix: Option<String>,
}

impl ParentCalendar {
    /// An empty or missing `ignore_prefix` disables title filtering.
    pub fn new(
        entity_id: &str,
        range: SyncDateRange,
        scheme: FingerprintScheme,
        ignore_prefix: Option<&str>,
    ) -> Self {
        ParentCalendar {
            calendar: Calendar::new(entity_id, range, scheme),
            ignore_prefix: ignore_prefix.filter(|p| !p.is_empty()).map(String::from),
        }
    }

    pub fn kind(&self) -> CalendarKind {
        CalendarKind::Parent
    }

    pub fn snapshot(&self) -> &Calendar<ParentEvent> {
        &self.calendar
    }

    pub fn entity_id(&self) -> &str {
        self.calendar.entity_id()
    }

    pub fn events(&self) -> &[ParentEvent] {
        self.calendar.events()
    }

    pub async fn load<P: CalendarProvider>(&mut self, provider: &P) -> MirrorResult<()> {
        self.calendar.load(provider).await?;

        if let Some(prefix) = &self.ignore_prefix {
            let before = self.calendar.len();
            self.calendar.retain(|e| !e.title().starts_with(prefix.as_str()));
            debug!(
                entity_id = %self.calendar.entity_id(),
                ignored = before - self.calendar.len(),
                "Dropped events with ignored title prefix"
            );
        }

        Ok(())
    }
}

/// A calendar events are mirrored into.
#[derive(Debug)]
pub struct ChildCalendar {
    calendar: Calendar<ChildEvent>,
    matcher: KeywordMatcher,
}

impl ChildCalendar {
    pub fn new(
        entity_id: &str,
        range: SyncDateRange,
        scheme: FingerprintScheme,
        keywords: &[String],
    ) -> MirrorResult<Self> {
        Ok(ChildCalendar {
            calendar: Calendar::new(entity_id, range, scheme),
            matcher: KeywordMatcher::new(keywords)?,
        })
    }

    pub fn kind(&self) -> CalendarKind {
        CalendarKind::Child
    }

    pub fn snapshot(&self) -> &Calendar<ChildEvent> {
        &self.calendar
    }

    pub fn entity_id(&self) -> &str {
        self.calendar.entity_id()
    }

    pub fn events(&self) -> &[ChildEvent] {
        self.calendar.events()
    }

    pub fn has_keywords(&self) -> bool {
        self.matcher.has_keywords()
    }

    /// Unresolved children receive no writes during a run.
    pub fn is_resolved(&self) -> bool {
        self.calendar.is_resolved()
    }

    pub fn keywords(&self) -> &[String] {
        self.matcher.keywords()
    }

    pub fn has_event(&self, fingerprint: &Fingerprint) -> bool {
        self.calendar.has_event(fingerprint)
    }

    pub async fn load<P: CalendarProvider>(&mut self, provider: &P) -> MirrorResult<()> {
        self.calendar.load(provider).await
    }

    /// True iff a keyword occurs as a whole word in `title`.
    pub fn selection_matches(&self, title: &str) -> bool {
        self.matcher.is_match(title)
    }

    /// Create a mirrored copy of `parent` and record it in the snapshot.
    pub async fn add_mirrored_event<P: CalendarProvider>(
        &mut self,
        provider: &P,
        parent: &ParentEvent,
    ) -> MirrorResult<()> {
        let payload = parent.mirror_payload(self.calendar.scheme());
        debug!(
            entity_id = %self.calendar.entity_id(),
            fingerprint = %parent.id(),
            summary = %payload.summary,
            "Creating mirrored event"
        );

        let created = provider
            .create_event(self.calendar.entity_id(), &payload)
            .await?;
        let child = ChildEvent::from_raw(created, self.calendar.scheme());
        self.calendar.push(child);

        if !self.calendar.has_event(parent.id()) {
            error!(
                entity_id = %self.calendar.entity_id(),
                fingerprint = %parent.id(),
                "Mirrored event is missing from the calendar index right after insertion"
            );
        }

        Ok(())
    }

    /// Delete the mirrored event carrying `fingerprint`.
    ///
    /// Callers must only pass fingerprints this calendar holds.
    pub async fn remove_event<P: CalendarProvider>(
        &mut self,
        provider: &P,
        fingerprint: &Fingerprint,
    ) -> MirrorResult<()> {
        let uid = self
            .calendar
            .event_for(fingerprint)
            .map(|e| e.raw().uid.clone())
            .ok_or_else(|| MirrorError::UnknownFingerprint {
                entity_id: self.calendar.entity_id().to_string(),
                fingerprint: fingerprint.to_string(),
            })?;

        debug!(
            entity_id = %self.calendar.entity_id(),
            fingerprint = %fingerprint,
            uid = %uid,
            "Deleting mirrored event"
        );

        provider.delete_event(self.calendar.entity_id(), &uid).await?;
        self.calendar.remove(fingerprint);
        Ok(())
    }

    /// Delete every mirrored event whose fingerprint is in `fingerprints`.
    /// Returns how many were deleted.
    pub async fn remove_overlapping<P: CalendarProvider>(
        &mut self,
        provider: &P,
        fingerprints: &HashSet<Fingerprint>,
    ) -> MirrorResult<usize> {
        let mut overlapping: Vec<Fingerprint> = fingerprints
            .iter()
            .filter(|fp| self.calendar.has_event(fp))
            .cloned()
            .collect();
        overlapping.sort();

        for fingerprint in &overlapping {
            self.remove_event(provider, fingerprint).await?;
        }

        Ok(overlapping.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryProvider, child_record, record};

    fn range() -> SyncDateRange {
        SyncDateRange::from_now(7).unwrap()
    }

    #[tokio::test]
    async fn load_wraps_records_and_indexes_them() {
        let provider = MemoryProvider::new();
        provider.insert("calendar.family", record("Soccer Practice"));
        provider.insert("calendar.family", record("Piano"));

        let mut parent =
            ParentCalendar::new("calendar.family", range(), FingerprintScheme::default(), None);
        parent.load(&provider).await.unwrap();

        assert_eq!(parent.events().len(), 2);
        for event in parent.events() {
            assert!(parent.snapshot().has_event(event.id()));
        }
    }

    #[tokio::test]
    async fn ignore_prefix_drops_matching_parent_titles() {
        let provider = MemoryProvider::new();
        provider.insert("calendar.family", record("Soccer Practice"));
        provider.insert("calendar.family", record("#private Soccer"));

        let mut parent = ParentCalendar::new(
            "calendar.family",
            range(),
            FingerprintScheme::default(),
            Some("#private"),
        );
        parent.load(&provider).await.unwrap();

        let titles: Vec<&str> = parent.events().iter().map(|e| e.title()).collect();
        assert_eq!(titles, vec!["Soccer Practice"]);
        assert_eq!(parent.snapshot().fingerprints().len(), 1);
    }

    #[tokio::test]
    async fn unknown_calendar_loads_empty() {
        let provider = MemoryProvider::new();

        let mut child = ChildCalendar::new(
            "calendar.missing",
            range(),
            FingerprintScheme::default(),
            &["soccer".to_string()],
        )
        .unwrap();
        child.load(&provider).await.unwrap();

        assert!(child.snapshot().is_empty());
        assert!(child.snapshot().fingerprints().is_empty());
        assert!(!child.is_resolved());

        provider.add_calendar("calendar.missing");
        child.load(&provider).await.unwrap();
        assert!(child.is_resolved());
    }

    #[tokio::test]
    async fn provider_failures_propagate_from_load() {
        let provider = MemoryProvider::new();
        provider.insert("calendar.family", record("Soccer Practice"));
        provider.fail_with("backend offline");

        let mut parent =
            ParentCalendar::new("calendar.family", range(), FingerprintScheme::default(), None);
        let result = parent.load(&provider).await;

        assert!(matches!(result, Err(MirrorError::Provider(_))));
    }

    #[tokio::test]
    async fn hand_made_child_events_are_not_indexed() {
        let provider = MemoryProvider::new();
        provider.insert("calendar.alice", record("Sleepover"));

        let mut child =
            ChildCalendar::new("calendar.alice", range(), FingerprintScheme::default(), &[])
                .unwrap();
        child.load(&provider).await.unwrap();

        assert_eq!(child.events().len(), 1);
        assert!(child.snapshot().fingerprints().is_empty());
    }

    #[tokio::test]
    async fn added_mirror_is_visible_immediately() {
        let scheme = FingerprintScheme::default();
        let provider = MemoryProvider::new();
        provider.insert("calendar.family", record("Soccer Practice"));
        provider.insert("calendar.alice", record("Sleepover"));

        let mut parent = ParentCalendar::new("calendar.family", range(), scheme.clone(), None);
        parent.load(&provider).await.unwrap();
        let mut child =
            ChildCalendar::new("calendar.alice", range(), scheme, &["soccer".to_string()])
                .unwrap();
        child.load(&provider).await.unwrap();

        let event = &parent.events()[0];
        child.add_mirrored_event(&provider, event).await.unwrap();

        assert!(child.has_event(event.id()));
        assert_eq!(child.events().len(), 2);
        assert_eq!(provider.events("calendar.alice").len(), 2);
    }

    #[tokio::test]
    async fn rewritten_copy_is_kept_but_not_indexed_under_the_parent() {
        let scheme = FingerprintScheme::default();
        let provider = MemoryProvider::new();
        provider.insert("calendar.family", record("Soccer Practice"));
        provider.add_calendar("calendar.alice");
        provider.rewrite_descriptions(Some("Notes were edited"));

        let mut parent = ParentCalendar::new("calendar.family", range(), scheme.clone(), None);
        parent.load(&provider).await.unwrap();
        let mut child =
            ChildCalendar::new("calendar.alice", range(), scheme, &["soccer".to_string()])
                .unwrap();
        child.load(&provider).await.unwrap();

        let event = &parent.events()[0];
        assert!(child.add_mirrored_event(&provider, event).await.is_ok());

        assert!(!child.has_event(event.id()));
        assert_eq!(child.events().len(), 1);
        assert_eq!(provider.events("calendar.alice").len(), 1);
    }

    #[tokio::test]
    async fn removing_deletes_from_provider_and_snapshot() {
        let scheme = FingerprintScheme::default();
        let provider = MemoryProvider::new();
        let mirrored = child_record("Soccer Practice", "1a2b3c4d");
        provider.insert("calendar.alice", mirrored);
        provider.insert("calendar.alice", record("Sleepover"));

        let mut child = ChildCalendar::new("calendar.alice", range(), scheme, &[]).unwrap();
        child.load(&provider).await.unwrap();

        let fingerprint = child.snapshot().fingerprints().into_iter().next().unwrap();
        child.remove_event(&provider, &fingerprint).await.unwrap();

        assert!(!child.has_event(&fingerprint));
        let remaining = provider.events("calendar.alice");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].summary, "Sleepover");
    }

    #[tokio::test]
    async fn removing_an_unknown_fingerprint_is_a_contract_violation() {
        let scheme = FingerprintScheme::default();
        let provider = MemoryProvider::new();
        provider.insert("calendar.alice", child_record("Soccer Practice", "1a2b3c4d"));

        let mut child = ChildCalendar::new("calendar.alice", range(), scheme.clone(), &[]).unwrap();
        child.load(&provider).await.unwrap();

        let stranger = scheme.compute(&record("Basketball"));
        let result = child.remove_event(&provider, &stranger).await;

        assert!(matches!(result, Err(MirrorError::UnknownFingerprint { .. })));
        assert_eq!(provider.deleted().len(), 0);
    }

    #[tokio::test]
    async fn remove_overlapping_only_touches_held_fingerprints() {
        let scheme = FingerprintScheme::default();
        let provider = MemoryProvider::new();
        provider.insert("calendar.alice", child_record("Soccer Practice", "1a2b3c4d"));
        provider.insert("calendar.alice", child_record("Piano", "99999999"));

        let mut child = ChildCalendar::new("calendar.alice", range(), scheme.clone(), &[]).unwrap();
        child.load(&provider).await.unwrap();

        let stale: HashSet<Fingerprint> = [
            scheme.extract(Some("[1a2b3c4d]")).unwrap(),
            scheme.extract(Some("[deadbeef]")).unwrap(),
        ]
        .into_iter()
        .collect();
        let removed = child.remove_overlapping(&provider, &stale).await.unwrap();

        assert_eq!(removed, 1);
        let remaining = provider.events("calendar.alice");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].summary, "Piano");
    }
}
