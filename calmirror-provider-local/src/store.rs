//! One JSON file per calendar: `<dir>/<entity_id>.json`, an array of events.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use calmirror_core::event::{EventPayload, RawEvent};
use chrono::{DateTime, FixedOffset};

/// Overrides the store directory.
pub const DIR_ENV: &str = "CALMIRROR_LOCAL_DIR";

pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        LocalStore { dir: dir.into() }
    }

    /// `$CALMIRROR_LOCAL_DIR`, else `<data dir>/calmirror/local`.
    pub fn from_env() -> Result<Self> {
        if let Ok(dir) = std::env::var(DIR_ENV) {
            return Ok(Self::new(dir));
        }

        let dir = dirs::data_dir()
            .context("Could not determine data directory")?
            .join("calmirror")
            .join("local");
        Ok(Self::new(dir))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn calendar_path(&self, entity_id: &str) -> Result<PathBuf> {
        if entity_id.is_empty()
            || entity_id.contains(['/', '\\'])
            || entity_id.starts_with('.')
        {
            anyhow::bail!("Invalid entity id '{}'", entity_id);
        }
        Ok(self.dir.join(format!("{}.json", entity_id)))
    }

    /// `None` when the calendar has no file.
    async fn read(&self, entity_id: &str) -> Result<Option<Vec<RawEvent>>> {
        let path = self.calendar_path(entity_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
        };

        if content.trim().is_empty() {
            return Ok(Some(Vec::new()));
        }

        let events = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(events))
    }

    async fn write(&self, entity_id: &str, events: &[RawEvent]) -> Result<()> {
        let path = self.calendar_path(entity_id)?;
        let tmp = path.with_extension("json.tmp");

        let content = serde_json::to_string_pretty(events)?;
        tokio::fs::write(&tmp, content)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    /// Events overlapping `[from, to)`.
    pub async fn list(
        &self,
        entity_id: &str,
        from: DateTime<FixedOffset>,
        to: DateTime<FixedOffset>,
    ) -> Result<Option<Vec<RawEvent>>> {
        let Some(events) = self.read(entity_id).await? else {
            return Ok(None);
        };

        Ok(Some(
            events
                .into_iter()
                .filter(|e| overlaps(e, from, to))
                .collect(),
        ))
    }

    pub async fn create(&self, entity_id: &str, payload: EventPayload) -> Result<Option<RawEvent>> {
        let Some(mut events) = self.read(entity_id).await? else {
            return Ok(None);
        };

        let event = payload.into_raw(uuid::Uuid::new_v4().to_string());
        events.push(event.clone());
        self.write(entity_id, &events).await?;
        Ok(Some(event))
    }

    /// Deleting a uid that is already gone succeeds.
    pub async fn delete(&self, entity_id: &str, uid: &str) -> Result<Option<()>> {
        let Some(mut events) = self.read(entity_id).await? else {
            return Ok(None);
        };

        let before = events.len();
        events.retain(|e| e.uid != uid);
        if events.len() != before {
            self.write(entity_id, &events).await?;
        }
        Ok(Some(()))
    }
}

/// Half-open overlap; a zero-length event counts if its instant is inside.
fn overlaps(event: &RawEvent, from: DateTime<FixedOffset>, to: DateTime<FixedOffset>) -> bool {
    let (Some(start), Some(end)) = (event.start.to_utc(), event.end.to_utc()) else {
        return true;
    };
    let (from, to) = (from.to_utc(), to.to_utc());
    start < to && (end > from || start >= from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calmirror_core::event::EventTime;
    use chrono::{Duration, NaiveDate};

    fn at(text: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(text).unwrap()
    }

    fn payload(summary: &str, start: &str, hours: i64) -> EventPayload {
        let start = at(start);
        EventPayload {
            summary: summary.to_string(),
            description: None,
            location: None,
            start: EventTime::DateTime(start),
            end: EventTime::DateTime(start + Duration::hours(hours)),
        }
    }

    fn store_with(entity_id: &str) -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(format!("{}.json", entity_id)), "[]").unwrap();
        let store = LocalStore::new(dir.path());
        (dir, store)
    }

    #[tokio::test]
    async fn missing_calendar_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        let from = at("2025-03-20T00:00:00Z");
        assert!(store.list("calendar.nope", from, from).await.unwrap().is_none());
        assert!(
            store
                .create("calendar.nope", payload("x", "2025-03-20T10:00:00Z", 1))
                .await
                .unwrap()
                .is_none()
        );
        assert!(store.delete("calendar.nope", "uid").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_assigns_uid_and_persists() {
        let (_dir, store) = store_with("calendar.alice");

        let created = store
            .create("calendar.alice", payload("Soccer", "2025-03-20T10:00:00Z", 1))
            .await
            .unwrap()
            .unwrap();
        assert!(uuid::Uuid::parse_str(&created.uid).is_ok());

        let reopened = LocalStore::new(store.dir());
        let listed = reopened
            .list(
                "calendar.alice",
                at("2025-03-20T00:00:00Z"),
                at("2025-03-21T00:00:00Z"),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn list_returns_only_overlapping_events() {
        let (_dir, store) = store_with("calendar.family");
        for (summary, start) in [
            ("before", "2025-03-19T10:00:00Z"),
            ("straddles start", "2025-03-19T23:30:00Z"),
            ("inside", "2025-03-20T12:00:00Z"),
            ("after", "2025-03-21T00:00:00Z"),
        ] {
            store
                .create("calendar.family", payload(summary, start, 1))
                .await
                .unwrap();
        }

        let listed = store
            .list(
                "calendar.family",
                at("2025-03-20T00:00:00Z"),
                at("2025-03-21T00:00:00Z"),
            )
            .await
            .unwrap()
            .unwrap();
        let titles: Vec<&str> = listed.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(titles, vec!["straddles start", "inside"]);
    }

    #[tokio::test]
    async fn all_day_events_overlap_by_date() {
        let (_dir, store) = store_with("calendar.family");
        let day = NaiveDate::from_ymd_opt(2025, 3, 20).unwrap();
        store
            .create(
                "calendar.family",
                EventPayload {
                    summary: "Picnic".to_string(),
                    description: None,
                    location: None,
                    start: EventTime::Date(day),
                    end: EventTime::Date(day.succ_opt().unwrap()),
                },
            )
            .await
            .unwrap();

        let listed = store
            .list(
                "calendar.family",
                at("2025-03-20T09:00:00Z"),
                at("2025-03-27T09:00:00Z"),
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn delete_removes_by_uid_and_tolerates_unknown_uids() {
        let (_dir, store) = store_with("calendar.alice");
        let created = store
            .create("calendar.alice", payload("Soccer", "2025-03-20T10:00:00Z", 1))
            .await
            .unwrap()
            .unwrap();

        assert!(store.delete("calendar.alice", "unknown").await.unwrap().is_some());
        assert!(store.delete("calendar.alice", &created.uid).await.unwrap().is_some());

        let listed = store
            .list(
                "calendar.alice",
                at("2025-03-01T00:00:00Z"),
                at("2025-04-01T00:00:00Z"),
            )
            .await
            .unwrap()
            .unwrap();
        assert!(listed.is_empty());
    }

    #[tokio::test]
    async fn rejects_entity_ids_that_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path());

        assert!(store.delete("../calendar.alice", "uid").await.is_err());
        assert!(store.delete("", "uid").await.is_err());
    }
}
