//! Permission-aware atomic artifact writes.
//!
//! Write protocol per artifact:
//!
//! 1. No-op when the change detector saw no difference.
//! 2. Create the parent directory (including parents) if absent.
//! 3. Write to `<path>.certrelay.tmp` in the same directory.
//! 4. Set the exact target mode on the temp file.
//! 5. Rename into place (atomic on POSIX); a crash mid-write never leaves
//!    a truncated artifact visible.

use std::path::{Path, PathBuf};

use crate::error::{io_err, SyncError};

/// Private keys: owner read/write, group read, others none.
pub const MODE_PRIVATE_KEY: u32 = 0o640;
/// Certificates, chains, and restart flags: world-readable.
pub const MODE_PUBLIC: u32 = 0o644;

/// Outcome of an individual artifact write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// The artifact was persisted (content changed or did not exist).
    Written { path: PathBuf },
    /// No change detected; nothing touched.
    Unchanged { path: PathBuf },
}

/// Persist `content` to `path` with `mode` iff `changed` is true.
pub fn write_if_changed(
    path: &Path,
    content: &str,
    changed: bool,
    mode: u32,
) -> Result<WriteResult, SyncError> {
    if !changed {
        tracing::debug!("skipping unchanged artifact: {}", path.display());
        return Ok(WriteResult::Unchanged {
            path: path.to_path_buf(),
        });
    }
    let tmp = PathBuf::from(format!("{}.certrelay.tmp", path.display()));
    write_with_tmp(path, content, mode, &tmp)
}

fn write_with_tmp(
    path: &Path,
    content: &str,
    mode: u32,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }

    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;

    // Mode is in place before the artifact becomes visible under `path`.
    if let Err(err) = set_mode(tmp, mode) {
        let _ = std::fs::remove_file(tmp);
        return Err(err);
    }

    if let Err(err) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, err));
    }

    tracing::info!("wrote: {} (mode {mode:03o})", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> Result<(), SyncError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> Result<(), SyncError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn first_write_returns_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hub_cert.pem");
        let result = write_if_changed(&path, "-----BEGIN CERT", true, MODE_PUBLIC).unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "-----BEGIN CERT");
    }

    #[test]
    fn unchanged_is_a_noop_even_for_missing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hub_cert.pem");
        let result = write_if_changed(&path, "content", false, MODE_PUBLIC).unwrap();
        assert!(matches!(result, WriteResult::Unchanged { .. }));
        assert!(!path.exists(), "unchanged write must not create files");
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hub_key.pem");
        write_if_changed(&path, "data", true, MODE_PRIVATE_KEY).unwrap();
        let tmp_path = PathBuf::from(format!("{}.certrelay.tmp", path.display()));
        assert!(!tmp_path.exists(), ".certrelay.tmp must be cleaned up");
    }

    #[test]
    fn creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("certs").join("deep").join("hub_cert.pem");
        write_if_changed(&path, "content", true, MODE_PUBLIC).unwrap();
        assert!(path.exists());
    }

    #[test]
    #[cfg(unix)]
    fn private_key_mode_is_restrictive() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hub_key.pem");
        write_if_changed(&path, "key", true, MODE_PRIVATE_KEY).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o640);
    }

    #[test]
    #[cfg(unix)]
    fn certificate_mode_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hub_cert.pem");
        write_if_changed(&path, "cert", true, MODE_PUBLIC).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    #[cfg(unix)]
    fn rename_failure_leaves_original_and_cleans_tmp() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let readonly_dir = root.path().join("readonly");
        fs::create_dir_all(&readonly_dir).unwrap();

        let path = readonly_dir.join("hub_cert.pem");
        fs::write(&path, "original").unwrap();

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        let tmp_dir = TempDir::new().unwrap();
        let tmp_path = tmp_dir.path().join("hub_cert.pem.certrelay.tmp");

        match write_with_tmp(&path, "new content", MODE_PUBLIC, &tmp_path) {
            // Root bypasses directory permissions; nothing to assert then.
            Ok(_) => {}
            Err(_) => {
                let current = fs::read_to_string(&path).unwrap();
                assert_eq!(current, "original", "original file should be intact");
                assert!(!tmp_path.exists(), ".certrelay.tmp should be cleaned up");
            }
        }

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&readonly_dir, perms).unwrap();
    }
}
