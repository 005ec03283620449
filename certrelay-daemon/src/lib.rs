//! Daemon runtime: one sync at startup, then daily at local midnight, with
//! a run-overlap guard and a per-run deadline.

mod error;
pub mod runtime;
pub mod store_file;

pub use error::DaemonError;
pub use runtime::{run, start_blocking};
pub use store_file::FileStore;
