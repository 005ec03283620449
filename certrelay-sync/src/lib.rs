//! # certrelay-sync
//!
//! The synchronization engine: change-gated atomic artifact writes plus
//! latched restart signaling.
//!
//! Call [`run_once`] with a store and config to execute one full sync run,
//! or [`orchestrator::run`] with an already-fetched snapshot.

pub mod detect;
pub mod error;
pub mod orchestrator;
pub mod signal;
pub mod writer;

pub use error::SyncError;
pub use orchestrator::{run_once, CollectionReport, CollectionStatus, RunReport};
pub use signal::RaiseResult;
pub use writer::WriteResult;
