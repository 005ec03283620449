//! Certrelay core library — domain types, name validation, PEM checks,
//! configuration, and the store collaborator trait.
//!
//! Public API surface:
//! - [`types`] — newtypes and domain structs
//! - [`name`] — collection-name validation and normalization
//! - [`pem`] — structural PEM checks
//! - [`config`] — YAML configuration, loaded once at startup
//! - [`store`] — the [`CertificateStore`] collaborator trait
//! - [`error`] — [`ConfigError`], [`StoreError`], [`NameError`]

pub mod config;
pub mod error;
pub mod name;
pub mod pem;
pub mod store;
pub mod types;

pub use config::{FlagScope, SyncConfig};
pub use error::{ConfigError, NameError, StoreError};
pub use store::CertificateStore;
pub use types::{ArtifactSet, CertificateCollection, ChangeRecord, CollectionSnapshot, Token};
