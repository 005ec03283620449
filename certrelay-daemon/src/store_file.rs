//! JSON-file adapter for the certificate store.
//!
//! The document mirrors the configuration object the collections are
//! sourced from:
//!
//! ```json
//! {
//!   "native": {
//!     "collections": {
//!       "myhub": { "key": "...", "cert": "...", "chain": ["..."] }
//!     }
//!   }
//! }
//! ```

use std::path::PathBuf;

use serde::Deserialize;

use certrelay_core::types::CollectionSnapshot;
use certrelay_core::{CertificateStore, StoreError};

#[derive(Debug, Deserialize)]
struct StoreDocument {
    native: Option<NativeSection>,
}

#[derive(Debug, Deserialize)]
struct NativeSection {
    collections: Option<CollectionSnapshot>,
}

/// File-backed [`CertificateStore`], re-read from scratch every run.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CertificateStore for FileStore {
    fn fetch_collections(&self) -> Result<CollectionSnapshot, StoreError> {
        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::Unavailable {
                path: self.path.clone(),
                source: e,
            })?;
        let document: StoreDocument =
            serde_json::from_str(&contents).map_err(|e| StoreError::Malformed {
                path: self.path.clone(),
                detail: e.to_string(),
            })?;
        document
            .native
            .and_then(|native| native.collections)
            .ok_or_else(|| StoreError::Malformed {
                path: self.path.clone(),
                detail: "missing native.collections section".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn parses_collections_document() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        fs::write(
            &path,
            r#"{
                "native": {
                    "collections": {
                        "myhub": {
                            "key": "-----BEGIN KEY",
                            "cert": "-----BEGIN CERT",
                            "chain": ["-----BEGIN A", "-----BEGIN B"]
                        },
                        "bare": {}
                    }
                }
            }"#,
        )
        .unwrap();

        let snapshot = FileStore::new(&path).fetch_collections().unwrap();
        assert_eq!(snapshot.len(), 2);
        let myhub = &snapshot["myhub"];
        assert_eq!(myhub.key.as_deref(), Some("-----BEGIN KEY"));
        assert_eq!(myhub.chain.as_ref().map(|chain| chain.len()), Some(2));
        assert!(!snapshot["bare"].is_complete());
    }

    #[test]
    fn missing_file_is_unavailable() {
        let tmp = TempDir::new().unwrap();
        let err = FileStore::new(tmp.path().join("nope.json"))
            .fetch_collections()
            .expect_err("must fail");
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        fs::write(&path, "{not json").unwrap();
        let err = FileStore::new(&path)
            .fetch_collections()
            .expect_err("must fail");
        assert!(matches!(err, StoreError::Malformed { .. }));
    }

    #[test]
    fn missing_native_section_is_malformed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        fs::write(&path, r#"{"common": {}}"#).unwrap();
        let err = FileStore::new(&path)
            .fetch_collections()
            .expect_err("must fail");
        match err {
            StoreError::Malformed { detail, .. } => {
                assert!(detail.contains("native.collections"))
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }
}
