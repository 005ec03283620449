//! YAML configuration, resolved once at startup and passed by value into
//! the sync engine.
//!
//! ```yaml
//! base_dir: /opt/certrelay/certificates
//! store_path: /opt/certrelay/store.json
//! flag_scope: per_collection   # or: global
//! run_deadline_secs: 300
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Whether a detected change raises one flag per collection or a single
/// shared flag for the whole base directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FlagScope {
    #[default]
    PerCollection,
    Global,
}

/// Runtime configuration for the sync engine and daemon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Directory owned exclusively by certrelay; all artifacts and flags
    /// live directly under it.
    pub base_dir: PathBuf,
    /// Path to the JSON store document read once per run.
    pub store_path: PathBuf,
    #[serde(default)]
    pub flag_scope: FlagScope,
    /// Upper bound on one run's wall-clock time before the daemon stops
    /// waiting for it.
    #[serde(default = "default_run_deadline_secs")]
    pub run_deadline_secs: u64,
}

fn default_run_deadline_secs() -> u64 {
    300
}

/// Load the configuration from `path`.
///
/// Returns `ConfigError::NotFound` if absent, `ConfigError::Parse` (with
/// path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<SyncConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        source: e,
    })
}
