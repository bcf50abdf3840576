//! Reconciliation of parent calendars into child calendars.

mod change;
mod plan;
mod report;
mod worker;

pub use change::{ChangeKind, PlannedChange};
pub use plan::{ChildPlan, SyncPlan};
pub use report::{ChildReport, SyncReport};
pub use worker::{RunState, SyncWorker, sync_calendars};
