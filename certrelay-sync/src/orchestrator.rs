//! One full sync run: snapshot → per-collection pipeline → aggregated
//! report.
//!
//! Per-collection failures are isolated; only a failed snapshot fetch
//! aborts a run. Everything a run observes or decides ends up in the
//! [`RunReport`] for the caller's logger.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use certrelay_core::types::{ArtifactSet, CertificateCollection, CollectionSnapshot, Token};
use certrelay_core::{name, pem, CertificateStore, SyncConfig};

use crate::detect;
use crate::error::SyncError;
use crate::signal::{self, RaiseResult};
use crate::writer::{self, WriteResult, MODE_PRIVATE_KEY, MODE_PUBLIC};

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

/// Terminal state of one collection within one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum CollectionStatus {
    /// At least one artifact was written.
    Synced { written: usize, signal_raised: bool },
    /// Every artifact already matched the snapshot.
    Unchanged,
    /// Key or certificate missing in the store entry (informational).
    SkippedIncomplete,
    /// The raw name failed validation (informational).
    SkippedInvalidName,
    /// Key or certificate lacked the PEM header (error, disk untouched).
    SkippedInvalidPem,
    /// Two distinct raw names landed on the same token (data-integrity
    /// error; every involved collection is skipped).
    NameCollision,
    /// I/O failure mid-pipeline; remaining artifacts were skipped.
    Error { detail: String },
}

/// Per-collection outcome within a [`RunReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub name: String,
    #[serde(flatten)]
    pub status: CollectionStatus,
}

/// Aggregated outcome of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Collections that completed the pipeline (synced or unchanged).
    pub processed: usize,
    /// Collections skipped by validation (incomplete, bad name, bad PEM).
    pub skipped: usize,
    /// Collections with at least one artifact written.
    pub changed: usize,
    /// Collections that hit a collision or I/O failure.
    pub errored: usize,
    pub collections: Vec<CollectionReport>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Fetch one snapshot from `store` and sync it.
///
/// The only failure that propagates is the snapshot fetch itself.
pub fn run_once(store: &dyn CertificateStore, config: &SyncConfig) -> Result<RunReport, SyncError> {
    let snapshot = store.fetch_collections()?;
    Ok(run(&snapshot, config))
}

/// Sync an already-fetched snapshot.
pub fn run(snapshot: &CollectionSnapshot, config: &SyncConfig) -> RunReport {
    let started_at = Utc::now();

    // Token pass: validate every name and find collisions before anything
    // touches disk.
    let mut tokens: BTreeMap<&str, Token> = BTreeMap::new();
    for raw in snapshot.keys() {
        match name::normalize(raw) {
            Ok(token) => {
                tokens.insert(raw.as_str(), token);
            }
            Err(err) => tracing::info!("skipping collection: {err}"),
        }
    }
    let colliding = find_collisions(&tokens);

    let mut collections = Vec::with_capacity(snapshot.len());
    for (raw, collection) in snapshot {
        let status = match tokens.get(raw.as_str()) {
            None => CollectionStatus::SkippedInvalidName,
            Some(token) if colliding.contains(raw.as_str()) => {
                tracing::error!("collection name collision on token '{token}': '{raw}' skipped");
                CollectionStatus::NameCollision
            }
            Some(token) => sync_collection(token, collection, config),
        };
        collections.push(CollectionReport {
            name: raw.clone(),
            status,
        });
    }

    let (mut processed, mut skipped, mut changed, mut errored) = (0, 0, 0, 0);
    for entry in &collections {
        match &entry.status {
            CollectionStatus::Synced { .. } => {
                processed += 1;
                changed += 1;
            }
            CollectionStatus::Unchanged => processed += 1,
            CollectionStatus::SkippedIncomplete
            | CollectionStatus::SkippedInvalidName
            | CollectionStatus::SkippedInvalidPem => skipped += 1,
            CollectionStatus::NameCollision | CollectionStatus::Error { .. } => errored += 1,
        }
    }

    RunReport {
        started_at,
        finished_at: Utc::now(),
        processed,
        skipped,
        changed,
        errored,
        collections,
    }
}

/// Raw names whose tokens are claimed by more than one distinct raw name.
///
/// Normalization is currently the identity, so this cannot fire today; the
/// check guards the uniqueness requirement against any future
/// normalization rule.
fn find_collisions<'a>(tokens: &BTreeMap<&'a str, Token>) -> BTreeSet<&'a str> {
    let mut by_token: BTreeMap<&Token, Vec<&'a str>> = BTreeMap::new();
    for (&raw, token) in tokens {
        by_token.entry(token).or_default().push(raw);
    }
    by_token
        .into_values()
        .filter(|raws| raws.len() > 1)
        .flatten()
        .collect()
}

// ---------------------------------------------------------------------------
// Per-collection pipeline
// ---------------------------------------------------------------------------

fn sync_collection(
    token: &Token,
    collection: &CertificateCollection,
    config: &SyncConfig,
) -> CollectionStatus {
    let (Some(key), Some(cert)) = (collection.key.as_deref(), collection.cert.as_deref()) else {
        tracing::info!("no usable key/cert for collection '{token}', skipping");
        return CollectionStatus::SkippedIncomplete;
    };

    if !pem::is_well_formed(key) {
        tracing::error!("invalid private key for collection '{token}'");
        return CollectionStatus::SkippedInvalidPem;
    }
    if !pem::is_well_formed(cert) {
        tracing::error!("invalid certificate for collection '{token}'");
        return CollectionStatus::SkippedInvalidPem;
    }

    let artifacts = ArtifactSet::for_token(&config.base_dir, token);
    let chain = collection.chain_content();
    let changes = detect::detect(&artifacts, key, cert, chain.as_deref());
    if !changes.any() {
        tracing::debug!("collection '{token}' unchanged");
        return CollectionStatus::Unchanged;
    }

    let mut steps: Vec<(&std::path::Path, &str, bool, u32)> = vec![
        (&artifacts.key_path, key, changes.key, MODE_PRIVATE_KEY),
        (&artifacts.cert_path, cert, changes.cert, MODE_PUBLIC),
    ];
    if let Some(joined) = chain.as_deref() {
        steps.push((&artifacts.chain_path, joined, changes.chain, MODE_PUBLIC));
    }

    let mut written = 0usize;
    let mut failure: Option<SyncError> = None;
    for (path, content, changed, mode) in steps {
        match writer::write_if_changed(path, content, changed, mode) {
            Ok(WriteResult::Written { .. }) => written += 1,
            Ok(WriteResult::Unchanged { .. }) => {}
            Err(err) => {
                tracing::error!("write failed for collection '{token}': {err}");
                failure = Some(err);
                break;
            }
        }
    }

    // Anything that landed on disk warrants a restart, even when a later
    // artifact of the same collection failed.
    let mut signal_raised = false;
    if written > 0 {
        match signal::raise(&config.base_dir, config.flag_scope, token) {
            Ok(RaiseResult::Raised { .. }) => signal_raised = true,
            Ok(RaiseResult::AlreadyPresent { .. }) => {}
            Err(err) => {
                tracing::error!("failed to raise restart flag for '{token}': {err}");
                if failure.is_none() {
                    failure = Some(err);
                }
            }
        }
    }

    match failure {
        Some(err) => CollectionStatus::Error {
            detail: err.to_string(),
        },
        None => CollectionStatus::Synced {
            written,
            signal_raised,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
