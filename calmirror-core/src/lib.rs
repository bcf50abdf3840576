//! Core types for calmirror.
//!
//! This crate holds everything the CLI and providers share:
//! - `event` and `fingerprint`: the wire records and the identity scheme
//!   that recognizes mirrored events across runs
//! - `calendar`: point-in-time snapshots of parent and child calendars
//! - `sync`: the reconciliation engine
//! - `provider` and `protocol`: the provider seam and its JSON protocol

pub mod calendar;
pub mod config;
pub mod constants;
pub mod date_range;
pub mod error;
pub mod event;
pub mod fingerprint;
pub mod protocol;
pub mod provider;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;
