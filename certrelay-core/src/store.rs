//! The certificate-store collaborator.
//!
//! The store is external: certrelay only ever reads one immutable snapshot
//! per run and never writes back. Concrete adapters (the JSON file store in
//! certrelay-daemon, in-memory fakes in tests) implement this trait and are
//! injected into the orchestrator.

use crate::error::StoreError;
use crate::types::CollectionSnapshot;

/// Read access to the external certificate store.
pub trait CertificateStore {
    /// Fetch one snapshot of all collections.
    ///
    /// Failure aborts only the current run; the next scheduled run retries.
    fn fetch_collections(&self) -> Result<CollectionSnapshot, StoreError>;
}
