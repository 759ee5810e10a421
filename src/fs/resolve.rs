//! Destination path resolution
//!
//! The destination may be handed over as a symbolic link (a third party may
//! have moved the download and linked it back). The link chain is followed
//! exactly once, up front, so that baseline inspection and the walk operate
//! on the real directory.

use crate::error::{RestoreError, Result};
use std::io;
use std::path::{Path, PathBuf};

/// Resolve the destination root to a canonical, symlink-free directory.
///
/// Fails when the link chain is broken, the target does not exist, or the
/// resolved target is not a directory.
pub fn resolve(root: &Path) -> Result<PathBuf> {
    let canonical = std::fs::canonicalize(root).map_err(|e| RestoreError::resolution(root, e))?;

    let metadata =
        std::fs::metadata(&canonical).map_err(|e| RestoreError::resolution(root, e))?;
    if !metadata.is_dir() {
        return Err(RestoreError::resolution(
            root,
            io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
        ));
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_plain_directory() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve(dir.path()).unwrap();
        assert_eq!(resolved, std::fs::canonicalize(dir.path()).unwrap());
    }

    #[test]
    fn test_resolve_rejects_regular_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            resolve(&file),
            Err(RestoreError::Resolution { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_missing_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        assert!(matches!(
            resolve(&missing),
            Err(RestoreError::Resolution { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_follows_symlink_to_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("target");
        std::fs::create_dir(&target).unwrap();
        let link = dir.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let resolved = resolve(&link).unwrap();
        assert_eq!(resolved, std::fs::canonicalize(&target).unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn test_resolve_rejects_broken_symlink() {
        let dir = TempDir::new().unwrap();
        let link = dir.path().join("dangling");
        std::os::unix::fs::symlink(dir.path().join("nowhere"), &link).unwrap();

        let err = resolve(&link).unwrap_err();
        assert!(matches!(err, RestoreError::Resolution { .. }));
        assert_eq!(err.path(), &link);
    }
}
