use serde::Serialize;

use crate::sync::{ChangeKind, PlannedChange};

/// Writes a run would make to one child calendar, removals first.
#[derive(Debug, Clone, Serialize)]
pub struct ChildPlan {
    pub entity_id: String,
    pub changes: Vec<PlannedChange>,
}

impl ChildPlan {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.changes.iter().filter(|c| c.kind == kind).count()
    }
}

/// What a reconciliation run would do, computed without writing anything.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncPlan(pub Vec<ChildPlan>);

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(ChildPlan::is_empty)
    }

    /// (creates, deletes) across all children.
    pub fn counts(&self) -> (usize, usize) {
        self.0.iter().fold((0, 0), |(created, deleted), plan| {
            (
                created + plan.count(ChangeKind::Create),
                deleted + plan.count(ChangeKind::Delete),
            )
        })
    }
}
