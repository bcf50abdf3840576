//! Date window loaded from every calendar during a run.

use chrono::{DateTime, Duration, Local};

use crate::error::{MirrorError, MirrorResult};

/// Window of `days_to_sync` days starting now, in local time.
///
/// The end is always derived from the start and the day count, never stored.
#[derive(Debug, Clone)]
pub struct SyncDateRange {
    start: DateTime<Local>,
    days_to_sync: u32,
}

impl SyncDateRange {
    /// Fails when the end of the window is not a representable date.
    pub fn new(start: DateTime<Local>, days_to_sync: u32) -> MirrorResult<Self> {
        start
            .checked_add_signed(Duration::days(i64::from(days_to_sync)))
            .ok_or_else(|| {
                MirrorError::Config(format!(
                    "A window of {} days from {} is out of range",
                    days_to_sync,
                    start.format("%Y-%m-%d")
                ))
            })?;

        Ok(SyncDateRange {
            start,
            days_to_sync,
        })
    }

    /// Window starting at the current local time.
    pub fn from_now(days_to_sync: u32) -> MirrorResult<Self> {
        Self::new(Local::now(), days_to_sync)
    }

    pub fn start(&self) -> DateTime<Local> {
        self.start
    }

    pub fn days_to_sync(&self) -> u32 {
        self.days_to_sync
    }

    pub fn end(&self) -> DateTime<Local> {
        (self.start + Duration::days(i64::from(self.days_to_sync))).with_timezone(&Local)
    }

    /// Get `start` as RFC3339 string.
    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339()
    }

    /// Get `end` as RFC3339 string.
    pub fn end_rfc3339(&self) -> String {
        self.end().to_rfc3339()
    }
}
