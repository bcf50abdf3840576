/// Writes applied to one child calendar during a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildReport {
    pub entity_id: String,
    pub created: usize,
    pub deleted: usize,
}

/// Outcome of a completed reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport(pub Vec<ChildReport>);

impl SyncReport {
    pub fn created(&self) -> usize {
        self.0.iter().map(|r| r.created).sum()
    }

    pub fn deleted(&self) -> usize {
        self.0.iter().map(|r| r.deleted).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.created() == 0 && self.deleted() == 0
    }

    pub fn for_child(&self, entity_id: &str) -> Option<&ChildReport> {
        self.0.iter().find(|r| r.entity_id == entity_id)
    }
}
