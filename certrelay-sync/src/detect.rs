//! Content-level change detection against the filesystem's current state.
//!
//! Candidate material is compared byte-for-byte (via SHA-256 digests)
//! against whatever is on disk right now. No whitespace or line-ending
//! normalization: a PEM that differs only in formatting counts as changed.

use std::path::Path;

use sha2::{Digest, Sha256};

use certrelay_core::types::{ArtifactSet, ChangeRecord};

fn digest(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// True if `path` is absent, unreadable, or its content differs from
/// `candidate`.
///
/// A read failure forces a rewrite rather than silently skipping an
/// update.
pub fn has_changed(path: &Path, candidate: &[u8]) -> bool {
    if !path.exists() {
        tracing::debug!("missing, will write: {}", path.display());
        return true;
    }
    let current = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(
                "unreadable during diff, forcing rewrite: {}: {err}",
                path.display()
            );
            return true;
        }
    };
    let on_disk = digest(&current);
    let wanted = digest(candidate);
    if on_disk == wanted {
        tracing::debug!("unchanged: {} ({})", path.display(), &wanted[..12]);
        false
    } else {
        tracing::debug!(
            "changed: {} ({} -> {})",
            path.display(),
            &on_disk[..12],
            &wanted[..12]
        );
        true
    }
}

/// Compare all three artifact kinds for one collection.
///
/// The chain is compared as a single joined unit; a collection without a
/// chain never registers a chain change.
pub fn detect(artifacts: &ArtifactSet, key: &str, cert: &str, chain: Option<&str>) -> ChangeRecord {
    ChangeRecord {
        key: has_changed(&artifacts.key_path, key.as_bytes()),
        cert: has_changed(&artifacts.cert_path, cert.as_bytes()),
        chain: chain
            .map(|joined| has_changed(&artifacts.chain_path, joined.as_bytes()))
            .unwrap_or(false),
    }
}
