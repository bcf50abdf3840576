//! One reconciliation run: load, diff, remove, add.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::calendar::{CalendarEvent, ChildCalendar, ParentCalendar};
use crate::config::MirrorConfig;
use crate::date_range::SyncDateRange;
use crate::error::{MirrorError, MirrorResult};
use crate::fingerprint::{Fingerprint, FingerprintScheme};
use crate::provider::CalendarProvider;
use crate::sync::{ChildPlan, ChildReport, PlannedChange, SyncPlan, SyncReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Unconfigured,
    Loaded,
    Reconciled,
}

/// Mirrors parent calendar events into child calendars.
///
/// Snapshots are built fresh for every run; the fingerprint tokens inside
/// child descriptions are the only state carried between runs.
pub struct SyncWorker<'a, P> {
    provider: &'a P,
    config: &'a MirrorConfig,
    range: SyncDateRange,
    scheme: FingerprintScheme,
    state: RunState,
    parents: Vec<ParentCalendar>,
    children: Vec<ChildCalendar>,
    /// Child entity id -> the parent entity id it mirrors completely.
    copy_all: HashMap<String, String>,
}

impl<'a, P: CalendarProvider> SyncWorker<'a, P> {
    pub fn new(provider: &'a P, config: &'a MirrorConfig) -> MirrorResult<Self> {
        Ok(SyncWorker {
            provider,
            config,
            range: SyncDateRange::from_now(config.options.days_to_sync)?,
            scheme: config.fingerprint_scheme()?,
            state: RunState::Unconfigured,
            parents: Vec::new(),
            children: Vec::new(),
            copy_all: HashMap::new(),
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn range(&self) -> &SyncDateRange {
        &self.range
    }

    pub fn parents(&self) -> &[ParentCalendar] {
        &self.parents
    }

    pub fn children(&self) -> &[ChildCalendar] {
        &self.children
    }

    /// Build and load a snapshot for every configured calendar, in
    /// configuration order.
    pub async fn setup(&mut self) -> MirrorResult<()> {
        let config = self.config;
        self.parents.clear();
        self.children.clear();
        self.copy_all.clear();

        for parent_config in &config.parent {
            let mut calendar = ParentCalendar::new(
                &parent_config.entity_id,
                self.range.clone(),
                self.scheme.clone(),
                config.ignore_prefix(),
            );
            calendar.load(self.provider).await?;
            debug!(
                kind = %calendar.kind(),
                entity_id = %calendar.entity_id(),
                events = calendar.events().len(),
                "Loaded calendar"
            );
            self.parents.push(calendar);
        }

        for child_config in &config.child {
            if let Some(source) = &child_config.copy_all_from {
                if !config.parent.iter().any(|p| p.entity_id == source.entity_id) {
                    warn!(
                        child = %child_config.entity_id,
                        copy_all_from = %source.entity_id,
                        "copy_all_from names a calendar that is not a configured parent"
                    );
                }
                self.copy_all
                    .insert(child_config.entity_id.clone(), source.entity_id.clone());
            }

            let mut calendar = ChildCalendar::new(
                &child_config.entity_id,
                self.range.clone(),
                self.scheme.clone(),
                &child_config.keywords,
            )?;
            calendar.load(self.provider).await?;
            debug!(
                kind = %calendar.kind(),
                entity_id = %calendar.entity_id(),
                events = calendar.events().len(),
                mirrored = calendar.snapshot().fingerprints().len(),
                keywords = ?calendar.keywords(),
                "Loaded calendar"
            );
            self.children.push(calendar);
        }

        if self.parents.is_empty() || self.children.is_empty() {
            warn!(
                parents = self.parents.len(),
                children = self.children.len(),
                "Need at least one parent and one child calendar"
            );
        }

        self.state = RunState::Loaded;
        Ok(())
    }

    /// Fingerprints held by some child that no parent event produces anymore.
    fn stale_fingerprints(&self) -> HashSet<Fingerprint> {
        let parent_fingerprints: HashSet<Fingerprint> = self
            .parents
            .iter()
            .flat_map(|c| c.snapshot().fingerprints())
            .collect();

        self.children
            .iter()
            .flat_map(|c| c.snapshot().fingerprints())
            .filter(|fp| !parent_fingerprints.contains(fp))
            .collect()
    }

    fn require_loaded(&self) -> MirrorResult<()> {
        match self.state {
            RunState::Unconfigured => Err(MirrorError::InvalidState(
                "calendars must be loaded with setup() first".into(),
            )),
            RunState::Loaded | RunState::Reconciled => Ok(()),
        }
    }

    /// Compute the writes `sync` would make, without making them.
    pub fn plan(&self) -> MirrorResult<SyncPlan> {
        self.require_loaded()?;
        let stale = self.stale_fingerprints();

        let plans = self
            .children
            .iter()
            .map(|child| {
                let snapshot = child.snapshot();
                let mut held = snapshot.fingerprints();
                let mut changes = Vec::new();

                let mut doomed: Vec<&Fingerprint> =
                    stale.iter().filter(|fp| held.contains(*fp)).collect();
                doomed.sort();
                for fingerprint in doomed {
                    if let Some(event) = snapshot.event_for(fingerprint) {
                        changes.push(PlannedChange::delete(event, fingerprint));
                    }
                    held.remove(fingerprint);
                }

                for parent in &self.parents {
                    let copy_all = copies_all(&self.copy_all, child, parent);
                    if !is_eligible(copy_all, child) {
                        continue;
                    }
                    for event in parent.events() {
                        if selects(copy_all, child, event) && held.insert(event.id().clone()) {
                            changes.push(PlannedChange::create(
                                event,
                                event.id(),
                                parent.entity_id(),
                            ));
                        }
                    }
                }

                ChildPlan {
                    entity_id: child.entity_id().to_string(),
                    changes,
                }
            })
            .collect();

        Ok(SyncPlan(plans))
    }

    /// Apply removals to every child, then additions.
    ///
    /// Provider errors abort the run; writes made before the failure stand.
    pub async fn sync(&mut self) -> MirrorResult<SyncReport> {
        self.require_loaded()?;

        let stale = self.stale_fingerprints();
        debug!(stale = stale.len(), "Computed stale fingerprints");

        let mut reports: Vec<ChildReport> = self
            .children
            .iter()
            .map(|c| ChildReport {
                entity_id: c.entity_id().to_string(),
                ..Default::default()
            })
            .collect();

        for (child, report) in self.children.iter_mut().zip(reports.iter_mut()) {
            if !child.is_resolved() {
                warn!(entity_id = %child.entity_id(), "Skipping unresolved child calendar");
                continue;
            }
            report.deleted = child.remove_overlapping(self.provider, &stale).await?;
        }

        for (child, report) in self.children.iter_mut().zip(reports.iter_mut()) {
            for parent in &self.parents {
                let copy_all = copies_all(&self.copy_all, child, parent);
                if !is_eligible(copy_all, child) {
                    continue;
                }

                for event in parent.events() {
                    if !selects(copy_all, child, event) || child.has_event(event.id()) {
                        continue;
                    }
                    child.add_mirrored_event(self.provider, event).await?;
                    report.created += 1;
                }
            }
        }

        self.state = RunState::Reconciled;

        let report = SyncReport(reports);
        info!(
            created = report.created(),
            deleted = report.deleted(),
            "Reconciliation finished"
        );
        Ok(report)
    }
}

/// Run one complete reconciliation pass.
pub async fn sync_calendars<P: CalendarProvider>(
    provider: &P,
    config: &MirrorConfig,
) -> MirrorResult<SyncReport> {
    let mut worker = SyncWorker::new(provider, config)?;
    worker.setup().await?;
    worker.sync().await
}

fn copies_all(
    copy_all: &HashMap<String, String>,
    child: &ChildCalendar,
    parent: &ParentCalendar,
) -> bool {
    copy_all
        .get(child.entity_id())
        .is_some_and(|source| source == parent.entity_id())
}

/// A parent is scanned when it is the child's copy-all source or the child
/// has keywords to match against. Unresolved children take no writes.
fn is_eligible(copy_all: bool, child: &ChildCalendar) -> bool {
    child.is_resolved() && (copy_all || child.has_keywords())
}

fn selects(copy_all: bool, child: &ChildCalendar, event: &impl CalendarEvent) -> bool {
    copy_all || child.selection_matches(event.title())
}
