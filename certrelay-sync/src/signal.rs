//! Latched restart flag.
//!
//! The flag tells a downstream consumer that new certificate material is
//! on disk. Raising is at-most-once per unresolved change-set: a flag that
//! already exists is left exactly as it is. Clearing belongs to the
//! consumer, never to certrelay.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use certrelay_core::config::FlagScope;
use certrelay_core::types::Token;

use crate::error::{io_err, SyncError};
use crate::writer::{set_mode, MODE_PUBLIC};

/// Fixed opaque payload written into a freshly raised flag.
pub const FLAG_PAYLOAD: &str = "restart";

/// Per-collection flag filename suffix: `<token>_new_ssl_cert.txt`.
pub const FLAG_SUFFIX: &str = "_new_ssl_cert.txt";
/// Shared flag filename for [`FlagScope::Global`].
pub const GLOBAL_FLAG_FILE: &str = "new_ssl_cert.txt";

/// Outcome of a raise attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaiseResult {
    /// The flag was created.
    Raised { path: PathBuf },
    /// A flag was already pending; it was not touched.
    AlreadyPresent { path: PathBuf },
}

/// Where the flag for `token` lives under `base`, per scope policy.
pub fn flag_path(base: &Path, scope: FlagScope, token: &Token) -> PathBuf {
    match scope {
        FlagScope::PerCollection => base.join(format!("{token}{FLAG_SUFFIX}")),
        FlagScope::Global => base.join(GLOBAL_FLAG_FILE),
    }
}

/// Raise the restart flag for `token`.
///
/// `create_new` makes the existence check and the creation one atomic step,
/// so concurrent raisers on a shared global flag cannot double-create, and
/// a present flag is never truncated or rewritten.
pub fn raise(base: &Path, scope: FlagScope, token: &Token) -> Result<RaiseResult, SyncError> {
    let path = flag_path(base, scope, token);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    match options.open(&path) {
        Ok(mut file) => {
            file.write_all(FLAG_PAYLOAD.as_bytes())
                .map_err(|e| io_err(&path, e))?;
            drop(file);
            set_mode(&path, MODE_PUBLIC)?;
            tracing::info!("restart flag raised: {}", path.display());
            Ok(RaiseResult::Raised { path })
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            tracing::warn!(
                "restart flag already present, leaving untouched: {}",
                path.display()
            );
            Ok(RaiseResult::AlreadyPresent { path })
        }
        Err(err) => Err(io_err(&path, err)),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use certrelay_core::name;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn raise_creates_flag_with_payload() {
        let tmp = TempDir::new().unwrap();
        let token = name::normalize("myhub").unwrap();
        let result = raise(tmp.path(), FlagScope::PerCollection, &token).unwrap();

        let path = tmp.path().join("myhub_new_ssl_cert.txt");
        assert_eq!(result, RaiseResult::Raised { path: path.clone() });
        assert_eq!(fs::read_to_string(&path).unwrap(), "restart");
    }

    #[test]
    #[cfg(unix)]
    fn flag_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let token = name::normalize("myhub").unwrap();
        raise(tmp.path(), FlagScope::PerCollection, &token).unwrap();

        let path = tmp.path().join("myhub_new_ssl_cert.txt");
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn second_raise_leaves_existing_flag_untouched() {
        let tmp = TempDir::new().unwrap();
        let token = name::normalize("myhub").unwrap();
        let path = tmp.path().join("myhub_new_ssl_cert.txt");
        fs::write(&path, "consumer-specific note").unwrap();

        let result = raise(tmp.path(), FlagScope::PerCollection, &token).unwrap();
        assert_eq!(result, RaiseResult::AlreadyPresent { path: path.clone() });
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "consumer-specific note",
            "present flag must never be rewritten"
        );
    }

    #[test]
    fn global_scope_shares_one_flag_file() {
        let tmp = TempDir::new().unwrap();
        let first = name::normalize("hub-a").unwrap();
        let second = name::normalize("hub-b").unwrap();

        let r1 = raise(tmp.path(), FlagScope::Global, &first).unwrap();
        let r2 = raise(tmp.path(), FlagScope::Global, &second).unwrap();

        let path = tmp.path().join("new_ssl_cert.txt");
        assert_eq!(r1, RaiseResult::Raised { path: path.clone() });
        assert_eq!(r2, RaiseResult::AlreadyPresent { path });
    }
}
