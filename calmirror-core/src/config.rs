//! calmirror configuration.
//!
//! Read from `~/.config/calmirror/config.toml` (or an explicit path), with
//! `CALMIRROR_*` environment variables layered on top, e.g.
//! `CALMIRROR_OPTIONS__DAYS_TO_SYNC=14`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DAYS_TO_SYNC, DEFAULT_HASH_LENGTH, DEFAULT_PROVIDER_TIMEOUT_SECS, MAX_DAYS_TO_SYNC,
};
use crate::error::{MirrorError, MirrorResult};
use crate::fingerprint::FingerprintScheme;

static DEFAULT_PROVIDER: &str = "local";

fn default_provider() -> String {
    DEFAULT_PROVIDER.to_string()
}

fn default_days_to_sync() -> u32 {
    DEFAULT_DAYS_TO_SYNC
}

fn default_hash_length() -> usize {
    DEFAULT_HASH_LENGTH
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Suffix of the provider binary (`calmirror-provider-<name>`).
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Per-call provider timeout in humantime format, e.g. "30s".
    #[serde(default)]
    pub provider_timeout: Option<String>,

    #[serde(default)]
    pub options: SyncOptions,

    #[serde(default)]
    pub parent: Vec<ParentConfig>,

    #[serde(default)]
    pub child: Vec<ChildConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    #[serde(default = "default_days_to_sync")]
    pub days_to_sync: u32,

    /// Parent events whose title starts with this are never mirrored.
    #[serde(default)]
    pub ignore_event_if_title_starts_with: String,

    /// Hex characters per fingerprint. Changing it orphans existing mirrors.
    #[serde(default = "default_hash_length")]
    pub hash_length: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            days_to_sync: DEFAULT_DAYS_TO_SYNC,
            ignore_event_if_title_starts_with: String::new(),
            hash_length: DEFAULT_HASH_LENGTH,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentConfig {
    pub entity_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildConfig {
    pub entity_id: String,

    /// Required; `[]` selects nothing by title.
    pub keywords: Vec<String>,

    /// Parent whose events are all mirrored here, whatever their title.
    #[serde(default)]
    pub copy_all_from: Option<CopyAllFrom>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyAllFrom {
    pub entity_id: String,
}

impl MirrorConfig {
    pub fn config_path() -> MirrorResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| MirrorError::Config("Could not determine config directory".into()))?
            .join("calmirror");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path`, or from the default location when `None`.
    pub fn load(path: Option<&Path>) -> MirrorResult<Self> {
        let path = match path {
            Some(p) => PathBuf::from(shellexpand::tilde(&p.to_string_lossy()).into_owned()),
            None => Self::config_path()?,
        };

        if !path.exists() {
            return Err(MirrorError::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }

        let builder = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml))
            .add_source(
                Environment::with_prefix("CALMIRROR")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::from_builder(builder)
    }

    /// Parse a config from TOML text.
    pub fn parse(toml: &str) -> MirrorResult<Self> {
        Self::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> MirrorResult<Self> {
        let config: MirrorConfig = builder
            .build()
            .map_err(|e| MirrorError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| MirrorError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MirrorResult<()> {
        if self.provider.trim().is_empty() {
            return Err(MirrorError::Config("provider must not be empty".into()));
        }

        if !(1..=MAX_DAYS_TO_SYNC).contains(&self.options.days_to_sync) {
            return Err(MirrorError::Config(format!(
                "options.days_to_sync must be between 1 and {}, got {}",
                MAX_DAYS_TO_SYNC, self.options.days_to_sync
            )));
        }

        self.fingerprint_scheme()?;
        self.provider_timeout()?;

        let entity_ids = self
            .parent
            .iter()
            .map(|p| &p.entity_id)
            .chain(self.child.iter().map(|c| &c.entity_id))
            .chain(
                self.child
                    .iter()
                    .filter_map(|c| c.copy_all_from.as_ref().map(|f| &f.entity_id)),
            );
        for entity_id in entity_ids {
            if entity_id.trim().is_empty() {
                return Err(MirrorError::Config("entity_id must not be empty".into()));
            }
        }

        Ok(())
    }

    pub fn fingerprint_scheme(&self) -> MirrorResult<FingerprintScheme> {
        FingerprintScheme::with_length(self.options.hash_length)
    }

    pub fn provider_timeout(&self) -> MirrorResult<Duration> {
        match &self.provider_timeout {
            Some(text) => humantime::parse_duration(text).map_err(|e| {
                MirrorError::Config(format!("Invalid provider_timeout '{}': {}", text, e))
            }),
            None => Ok(Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS)),
        }
    }

    /// Effective configuration, environment overrides included, as TOML.
    pub fn to_toml(&self) -> MirrorResult<String> {
        toml::to_string_pretty(self).map_err(|e| MirrorError::Serialization(e.to_string()))
    }

    /// Prefix filter for parent titles; `None` when disabled.
    pub fn ignore_prefix(&self) -> Option<&str> {
        let prefix = self.options.ignore_event_if_title_starts_with.as_str();
        (!prefix.is_empty()).then_some(prefix)
    }
}
