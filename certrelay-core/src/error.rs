//! Error types for certrelay-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (file not found, permission denied, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}")]
    NotFound { path: PathBuf },
}

/// Failure reading one snapshot from the certificate store.
///
/// Either variant aborts only the current run; the next scheduled run
/// retries from scratch.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing object could not be read at all.
    #[error("certificate store unavailable at {path}: {source}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The backing object was read but does not have the expected shape.
    #[error("certificate store at {path} is malformed: {detail}")]
    Malformed { path: PathBuf, detail: String },
}

/// A raw collection name was rejected by [`crate::name`].
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid collection name {name:?}: only ASCII letters, digits, '_' and '-' are allowed")]
pub struct NameError {
    pub name: String,
}
