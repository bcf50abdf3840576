//! Defines the JSON protocol used between calmirror and provider binaries
//! over stdin/stdout.
//!
//! Each invocation carries one `Request` line and answers with one
//! `Response` line.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::event::{EventPayload, RawEvent};

pub trait ProviderCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    ListEvents,
    CreateEvent,
    DeleteEvent,
}

/// Request sent from calmirror to a provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response sent from a provider to calmirror.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
    /// The requested calendar does not exist on the provider.
    NotFound { entity_id: String },
}

const FALLBACK_ERROR: &str = r#"{"status":"error","error":"Failed to serialize response"}"#;

impl<T: Serialize> Response<T> {
    pub fn success(data: T) -> String {
        serde_json::to_string(&Response::Success { data })
            .unwrap_or_else(|_| FALLBACK_ERROR.to_string())
    }
}

impl Response<()> {
    pub fn error(msg: &str) -> String {
        serde_json::to_string(&Response::<()>::Error {
            error: msg.to_string(),
        })
        .unwrap_or_else(|_| FALLBACK_ERROR.to_string())
    }

    pub fn not_found(entity_id: &str) -> String {
        serde_json::to_string(&Response::<()>::NotFound {
            entity_id: entity_id.to_string(),
        })
        .unwrap_or_else(|_| FALLBACK_ERROR.to_string())
    }
}

/// List events overlapping a time range.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvents {
    pub entity_id: String,
    /// RFC3339 window bounds.
    pub from: String,
    pub to: String,
}

impl ProviderCommand for ListEvents {
    type Response = Vec<RawEvent>;
    fn command() -> Command {
        Command::ListEvents
    }
}

/// Create a new event; the provider assigns the uid.
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateEvent {
    pub entity_id: String,
    pub event: EventPayload,
}

impl ProviderCommand for CreateEvent {
    type Response = RawEvent;
    fn command() -> Command {
        Command::CreateEvent
    }
}

/// Delete an event by uid.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteEvent {
    pub entity_id: String,
    pub uid: String,
}

impl ProviderCommand for DeleteEvent {
    type Response = ();
    fn command() -> Command {
        Command::DeleteEvent
    }
}
