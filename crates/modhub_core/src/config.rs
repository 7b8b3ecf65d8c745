//! Core configuration.
//!
//! # Responsibility
//! - Carry host-provided settings for logging, storage and commit policy.
//! - Parse them from JSON with build-mode defaults for missing fields.
//!
//! # Invariants
//! - A parsed config always carries a supported log level.

use crate::logging::{default_log_level, normalize_level};
use crate::staging::commit::CommitPolicy;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Host-level settings for the mod registry core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute directory for rolling log files; logging stays off when unset.
    pub log_dir: Option<PathBuf>,
    /// SQLite file holding durable enablement decisions.
    pub db_path: Option<PathBuf>,
    pub commit_policy: CommitPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level().to_string(),
            log_dir: None,
            db_path: None,
            commit_policy: CommitPolicy::default(),
        }
    }
}

impl CoreConfig {
    /// Parses a JSON config document.
    ///
    /// # Errors
    /// - `Parse` for malformed JSON or unknown enum values.
    /// - `InvalidLogLevel` for an unsupported `log_level`.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_str(raw).map_err(ConfigError::Parse)?;
        config.log_level = normalize_level(&config.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(config.log_level.clone()))?
            .to_string();
        Ok(config)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(serde_json::Error),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::InvalidLogLevel(value) => write!(f, "unsupported log level in config: {value}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::InvalidLogLevel(_) => None,
        }
    }
}
