//! Content-hash identity for mirrored events.
//!
//! A parent event's fingerprint is a truncated SHA-256 digest of its full
//! record. Mirrored copies carry that fingerprint in their description as a
//! bracketed token (`[1a2b3c4d]`), which is the only state that survives
//! between runs. Changing the token format orphans every existing mirror.

use std::fmt;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::constants::{DEFAULT_HASH_LENGTH, MAX_HASH_LENGTH};
use crate::error::{MirrorError, MirrorResult};
use crate::event::RawEvent;

/// Short lowercase hex identity of a parent event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The bracketed form embedded in mirrored descriptions.
    pub fn token(&self) -> String {
        format!("[{}]", self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Computes, embeds and extracts fingerprints of one fixed length.
#[derive(Debug, Clone)]
pub struct FingerprintScheme {
    length: usize,
    pattern: Regex,
}

impl Default for FingerprintScheme {
    fn default() -> Self {
        Self::with_length(DEFAULT_HASH_LENGTH).expect("default hash length is in range")
    }
}

impl FingerprintScheme {
    pub fn with_length(length: usize) -> MirrorResult<Self> {
        if !(DEFAULT_HASH_LENGTH..=MAX_HASH_LENGTH).contains(&length) {
            return Err(MirrorError::Config(format!(
                "hash_length must be between {} and {}, got {}",
                DEFAULT_HASH_LENGTH, MAX_HASH_LENGTH, length
            )));
        }

        let pattern = RegexBuilder::new(&format!(r"\[([a-z0-9]{{{length}}})\]"))
            .case_insensitive(true)
            .build()
            .map_err(|e| MirrorError::Config(e.to_string()))?;

        Ok(FingerprintScheme { length, pattern })
    }

    /// Fingerprint of a parent record: digest of its canonical JSON form.
    pub fn compute(&self, raw: &RawEvent) -> Fingerprint {
        // Serializing a plain struct of strings and chrono values cannot fail.
        let canonical = serde_json::to_string(raw).unwrap_or_default();

        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        let digest = format!("{:x}", hasher.finalize());

        Fingerprint(digest[..self.length].to_string())
    }

    /// Description for a mirrored copy with the token appended.
    pub fn embed(&self, description: Option<&str>, fingerprint: &Fingerprint) -> String {
        match description {
            Some(text) if !text.is_empty() => format!("{} {}", text, fingerprint.token()),
            _ => fingerprint.token(),
        }
    }

    /// First token found in a child description, if any.
    pub fn extract(&self, description: Option<&str>) -> Option<Fingerprint> {
        let captures = self.pattern.captures(description?)?;
        let token = captures.get(1)?.as_str();
        Some(Fingerprint(token.to_ascii_lowercase()))
    }
}
