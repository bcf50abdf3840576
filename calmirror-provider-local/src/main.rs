//! calmirror-provider-local - JSON file calendar provider for calmirror
//!
//! This binary implements the calmirror provider protocol, communicating
//! with calmirror via JSON over stdin/stdout.
//!
//! Each calendar is a file in the store directory:
//!   $CALMIRROR_LOCAL_DIR/{entity_id}.json
//! (default: ~/.local/share/calmirror/local). Create a calendar by writing
//! `[]` to its file.

mod store;

use std::io::{self, BufRead, Write};

use calmirror_core::protocol::{Command, CreateEvent, DeleteEvent, ListEvents, Request, Response};
use chrono::DateTime;
use serde_json::Value;

use crate::store::LocalStore;

#[tokio::main]
async fn main() {
    let store = match LocalStore::from_env() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                eprintln!("Failed to read stdin: {}", e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => handle_request(&store, request).await,
            Err(e) => Response::error(&format!("Failed to parse request: {}", e)),
        };

        if writeln!(stdout, "{}", response)
            .and_then(|_| stdout.flush())
            .is_err()
        {
            break;
        }
    }
}

async fn handle_request(store: &LocalStore, request: Request) -> String {
    match request.command {
        Command::ListEvents => handle_list_events(store, request.params).await,
        Command::CreateEvent => handle_create_event(store, request.params).await,
        Command::DeleteEvent => handle_delete_event(store, request.params).await,
    }
}

async fn handle_list_events(store: &LocalStore, params: Value) -> String {
    let params: ListEvents = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    let (from, to) = match (
        DateTime::parse_from_rfc3339(&params.from),
        DateTime::parse_from_rfc3339(&params.to),
    ) {
        (Ok(from), Ok(to)) => (from, to),
        (Err(e), _) | (_, Err(e)) => return Response::error(&format!("Invalid time range: {}", e)),
    };

    match store.list(&params.entity_id, from, to).await {
        Ok(Some(events)) => Response::success(events),
        Ok(None) => Response::not_found(&params.entity_id),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

async fn handle_create_event(store: &LocalStore, params: Value) -> String {
    let params: CreateEvent = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    match store.create(&params.entity_id, params.event).await {
        Ok(Some(event)) => Response::success(event),
        Ok(None) => Response::not_found(&params.entity_id),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}

async fn handle_delete_event(store: &LocalStore, params: Value) -> String {
    let params: DeleteEvent = match serde_json::from_value(params) {
        Ok(p) => p,
        Err(e) => return Response::error(&format!("Invalid params: {}", e)),
    };

    match store.delete(&params.entity_id, &params.uid).await {
        Ok(Some(())) => Response::success(()),
        Ok(None) => Response::not_found(&params.entity_id),
        Err(e) => Response::error(&format!("{:#}", e)),
    }
}
