//! Domain types for certificate collections and their on-disk artifacts.
//!
//! All path fields use `PathBuf`; never `&str` or `String` for filesystem
//! paths. Store-sourced types are deserializable via serde.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// The validated, filesystem-safe form of a collection name.
///
/// Obtain one through [`crate::name::normalize`]; a `Token` is what all
/// artifact paths are derived from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(pub String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Store-sourced types
// ---------------------------------------------------------------------------

/// One named bundle of TLS material as fetched from the store.
///
/// The store does not guarantee every entry carries usable material; a
/// collection missing its key or certificate is skipped informationally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CertificateCollection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<Vec<String>>,
}

impl CertificateCollection {
    /// True when both private key and certificate are present.
    pub fn is_complete(&self) -> bool {
        self.key.is_some() && self.cert.is_some()
    }

    /// The chain as a single write/compare unit: ordered blocks joined with
    /// a single `\n`. `None` when the collection carries no chain.
    pub fn chain_content(&self) -> Option<String> {
        self.chain.as_ref().map(|blocks| blocks.join("\n"))
    }
}

/// One immutable snapshot of all collections, captured once per run.
///
/// A BTreeMap keeps processing order deterministic for logs; correctness
/// never depends on iteration order.
pub type CollectionSnapshot = BTreeMap<String, CertificateCollection>;

// ---------------------------------------------------------------------------
// Derived filesystem layout
// ---------------------------------------------------------------------------

/// Filename suffixes under the base directory.
pub const KEY_SUFFIX: &str = "_key.pem";
pub const CERT_SUFFIX: &str = "_cert.pem";
pub const CHAIN_SUFFIX: &str = "_fullchain.pem";

/// The three target paths derived from a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
    pub chain_path: PathBuf,
}

impl ArtifactSet {
    /// `<base>/<token>_key.pem`, `_cert.pem`, `_fullchain.pem`.
    pub fn for_token(base: &Path, token: &Token) -> Self {
        Self {
            key_path: base.join(format!("{token}{KEY_SUFFIX}")),
            cert_path: base.join(format!("{token}{CERT_SUFFIX}")),
            chain_path: base.join(format!("{token}{CHAIN_SUFFIX}")),
        }
    }
}

/// Which artifacts of a collection differ from what is on disk.
///
/// Ephemeral; recomputed every run, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeRecord {
    pub key: bool,
    pub cert: bool,
    pub chain: bool,
}

impl ChangeRecord {
    pub fn any(&self) -> bool {
        self.key || self.cert || self.chain
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
