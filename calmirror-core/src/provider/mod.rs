//! The seam between the engine and calendar storage.

mod subprocess;

pub use subprocess::SubprocessProvider;

use crate::date_range::SyncDateRange;
use crate::error::MirrorResult;
use crate::event::{EventPayload, RawEvent};

/// Lists, creates and deletes events for calendars named by entity id.
///
/// Implementations report an entity id they cannot resolve as
/// `MirrorError::CalendarNotFound`; every other error aborts the run.
#[allow(async_fn_in_trait)]
pub trait CalendarProvider {
    async fn list_events(
        &self,
        entity_id: &str,
        range: &SyncDateRange,
    ) -> MirrorResult<Vec<RawEvent>>;

    /// Returns the stored record, including its provider-assigned uid.
    async fn create_event(&self, entity_id: &str, payload: &EventPayload)
    -> MirrorResult<RawEvent>;

    async fn delete_event(&self, entity_id: &str, uid: &str) -> MirrorResult<()>;
}
