//! Provider subprocess protocol.
//!
//! Each call spawns the provider binary (e.g. `calmirror-provider-local`),
//! writes one JSON request to its stdin and reads one JSON response from its
//! stdout. Any executable that speaks the protocol can be a provider.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use crate::date_range::SyncDateRange;
use crate::error::{MirrorError, MirrorResult};
use crate::event::{EventPayload, RawEvent};
use crate::protocol::{
    Command, CreateEvent, DeleteEvent, ListEvents, ProviderCommand, Request, Response,
};
use crate::provider::CalendarProvider;

#[derive(Clone, Debug)]
pub struct SubprocessProvider {
    name: String,
    timeout: Duration,
}

impl SubprocessProvider {
    pub fn new(name: &str, timeout: Duration) -> Self {
        SubprocessProvider {
            name: name.to_string(),
            timeout,
        }
    }

    pub fn binary_name(&self) -> String {
        format!("calmirror-provider-{}", self.name)
    }

    fn binary_path(&self) -> MirrorResult<PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| {
            MirrorError::ProviderNotInstalled(format!(
                "{} (install it with `cargo install {}`)",
                self.name, binary_name
            ))
        })
    }

    /// Call a typed provider command and return the result.
    ///
    /// The response type is inferred from the command's associated type.
    pub async fn call<C: ProviderCommand>(&self, cmd: C) -> MirrorResult<C::Response> {
        timeout(self.timeout, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| MirrorError::ProviderTimeout(self.timeout.as_secs()))?
    }

    /// Low-level call that sends a command with params and deserializes the response.
    async fn call_raw<P: Serialize, R: DeserializeOwned>(
        &self,
        command: Command,
        params: P,
    ) -> MirrorResult<R> {
        let request = Request {
            command,
            params: serde_json::to_value(params)?,
        };
        let request_json = serde_json::to_string(&request)?;

        let binary_path = self.binary_path()?;
        debug!(provider = %self.name, ?command, "Calling provider");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                MirrorError::Provider(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| MirrorError::Provider("Provider stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(MirrorError::Provider(format!(
                "Provider exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        let response_str = String::from_utf8_lossy(&output.stdout);
        if response_str.trim().is_empty() {
            return Err(MirrorError::Provider("Provider returned no response".into()));
        }

        let response: Response<R> = serde_json::from_str(response_str.trim())
            .map_err(|e| MirrorError::Provider(format!("Failed to parse response: {}", e)))?;

        match response {
            Response::Success { data } => Ok(data),
            Response::Error { error } => Err(MirrorError::Provider(error)),
            Response::NotFound { entity_id } => Err(MirrorError::CalendarNotFound(entity_id)),
        }
    }
}

impl CalendarProvider for SubprocessProvider {
    async fn list_events(
        &self,
        entity_id: &str,
        range: &SyncDateRange,
    ) -> MirrorResult<Vec<RawEvent>> {
        self.call(ListEvents {
            entity_id: entity_id.to_string(),
            from: range.start_rfc3339(),
            to: range.end_rfc3339(),
        })
        .await
    }

    async fn create_event(
        &self,
        entity_id: &str,
        payload: &EventPayload,
    ) -> MirrorResult<RawEvent> {
        self.call(CreateEvent {
            entity_id: entity_id.to_string(),
            event: payload.clone(),
        })
        .await
    }

    async fn delete_event(&self, entity_id: &str, uid: &str) -> MirrorResult<()> {
        self.call(DeleteEvent {
            entity_id: entity_id.to_string(),
            uid: uid.to_string(),
        })
        .await
    }
}
