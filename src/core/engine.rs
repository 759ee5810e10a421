//! Restore engine
//!
//! Orchestrates a single restore pass: resolve the destination once,
//! inspect the baseline once, then walk the tree and mutate every entry
//! with the baseline held fixed. Strictly sequential; the first failure
//! aborts the pass. A partially restored tree is always valid and a re-run
//! from the same destination converges to the same state.

use crate::config::RestoreConfig;
use crate::error::Result;
use crate::fs::{inspect, resolve, PermissionApplier, TreeWalker};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Result of a restore run
#[derive(Debug)]
pub struct RestoreReport {
    /// Resolved destination root
    pub root: PathBuf,
    /// Label of the restoration source that governed the run
    pub mode: &'static str,
    /// Entries visited and restored, the root included
    pub entries_restored: u64,
    /// Total duration
    pub duration: Duration,
    /// Whether this was a dry run
    pub dry_run: bool,
}

impl RestoreReport {
    /// Print summary to console
    pub fn print_summary(&self) {
        println!("\n=== Restore Summary ===");
        println!("Destination:     {}", self.root.display());
        println!("Restored from:   {}", self.mode);
        println!("Entries:         {}", self.entries_restored);
        println!("Duration:        {:.2?}", self.duration);
        if self.dry_run {
            println!("Dry run: no changes were written.");
        }
    }
}

/// Main restore engine
pub struct RestoreEngine {
    /// Configuration
    config: RestoreConfig,
}

impl RestoreEngine {
    /// Create a new restore engine
    pub fn new(config: RestoreConfig) -> Self {
        Self { config }
    }

    /// Execute the restore pass
    pub fn execute(&self) -> Result<RestoreReport> {
        let start_time = Instant::now();

        let root = resolve(&self.config.directory)?;
        let baseline = inspect(&root)?;
        tracing::info!(
            "using {} to restore permissions of {}",
            baseline.mode.label(),
            root.display()
        );

        let applier = PermissionApplier::new(baseline).dry_run(self.config.dry_run);
        let mode = applier.baseline().mode.label();

        let mut entries_restored = 0u64;
        for entry in TreeWalker::new(&root) {
            applier.apply(&entry?)?;
            entries_restored += 1;
        }

        Ok(RestoreReport {
            root,
            mode,
            entries_restored,
            duration: start_time.elapsed(),
            dry_run: self.config.dry_run,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RestoreError;
    use crate::fs::acl::{self, AclEntry, AclTag, PosixAcl};
    use crate::fs::inspect::umask_guard::UmaskGuard;
    use crate::fs::TreeWalker;
    use std::collections::BTreeMap;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;
    use tempfile::TempDir;

    fn engine_for(path: &Path) -> RestoreEngine {
        RestoreEngine::new(RestoreConfig {
            directory: path.to_path_buf(),
            dry_run: false,
        })
    }

    fn chmod(path: &Path, mode: u32) {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
    }

    fn mode_of(path: &Path) -> u32 {
        std::fs::symlink_metadata(path)
            .unwrap()
            .permissions()
            .mode()
            & 0o7777
    }

    fn tree_modes(root: &Path) -> BTreeMap<std::path::PathBuf, u32> {
        TreeWalker::new(root)
            .map(|e| {
                let e = e.unwrap();
                (e.path, e.mode)
            })
            .collect()
    }

    #[test]
    fn test_process_mode_rebuilds_modes_from_umask() {
        let _guard = UmaskGuard::set(0o027);
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("payload.bin");
        std::fs::write(&file, b"x").unwrap();
        chmod(&file, 0o777);
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        chmod(&sub, 0o700);
        chmod(dir.path(), 0o750);

        let report = engine_for(dir.path()).execute().unwrap();

        assert_eq!(report.entries_restored, 3);
        assert_eq!(report.mode, "process umask");
        assert_eq!(mode_of(&file), 0o640);
        assert_eq!(mode_of(&sub), 0o750);
    }

    #[test]
    fn test_the_root_itself_is_restored() {
        let _guard = UmaskGuard::set(0o027);
        let dir = TempDir::new().unwrap();
        chmod(dir.path(), 0o700);

        engine_for(dir.path()).execute().unwrap();

        assert_eq!(mode_of(dir.path()), 0o750);
    }

    #[test]
    fn test_setgid_root_propagates_to_every_entry() {
        let _guard = UmaskGuard::set(0o022);
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("file"), b"x").unwrap();
        std::fs::write(dir.path().join("sub/file"), b"x").unwrap();
        chmod(dir.path(), 0o2775);

        engine_for(dir.path()).execute().unwrap();

        let setgid = libc::S_ISGID as u32;
        for (path, mode) in tree_modes(dir.path()) {
            assert_eq!(mode & setgid, setgid, "setgid missing on {:?}", path);
        }
    }

    #[test]
    fn test_process_mode_discards_extended_acls() {
        let _guard = UmaskGuard::set(0o027);
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("archived");
        std::fs::write(&file, b"x").unwrap();
        chmod(&file, 0o777);

        // extended ACL as an archive extractor would leave behind
        let extracted = PosixAcl::new(vec![
            AclEntry::new(AclTag::UserObj, 0o7),
            AclEntry::qualified(AclTag::User, 1000, 0o7),
            AclEntry::new(AclTag::GroupObj, 0o7),
            AclEntry::new(AclTag::Mask, 0o7),
            AclEntry::new(AclTag::Other, 0o7),
        ]);
        if acl::write_access_acl(&file, &extracted).is_err() {
            eprintln!("skipping: filesystem without POSIX ACL support");
            return;
        }

        engine_for(dir.path()).execute().unwrap();

        assert_eq!(acl::read_access_acl(&file).unwrap(), None);
        assert_eq!(mode_of(&file), 0o640);
    }

    #[test]
    fn test_acl_mode_propagates_the_default_acl() {
        let dir = TempDir::new().unwrap();
        chmod(dir.path(), 0o2775);

        let default_acl = PosixAcl::new(vec![
            AclEntry::new(AclTag::UserObj, 0o7),
            AclEntry::new(AclTag::GroupObj, 0o5),
            AclEntry::qualified(AclTag::Group, 2000, 0o7),
            AclEntry::new(AclTag::Mask, 0o7),
            AclEntry::new(AclTag::Other, 0o5),
        ]);
        if acl::write_default_acl(dir.path(), &default_acl).is_err() {
            eprintln!("skipping: filesystem without POSIX ACL support");
            return;
        }

        let file = dir.path().join("episode.mkv");
        std::fs::write(&file, b"x").unwrap();
        chmod(&file, 0o4644);
        let sub = dir.path().join("extras");
        std::fs::create_dir(&sub).unwrap();

        let report = engine_for(dir.path()).execute().unwrap();
        assert_eq!(report.mode, "default ACL");

        // the file inherits the access ACL verbatim, setgid from the root,
        // and loses its setuid bit; only directories get the default ACL
        assert_eq!(acl::read_access_acl(&file).unwrap(), Some(default_acl.clone()));
        assert_eq!(acl::read_default_acl(&file).unwrap(), None);
        let file_mode = mode_of(&file);
        assert_eq!(file_mode & (libc::S_ISUID as u32), 0);
        assert_eq!(file_mode & (libc::S_ISVTX as u32), 0);
        assert_eq!(file_mode & (libc::S_ISGID as u32), libc::S_ISGID as u32);

        assert_eq!(acl::read_access_acl(&sub).unwrap(), Some(default_acl.clone()));
        assert_eq!(acl::read_default_acl(&sub).unwrap(), Some(default_acl));
    }

    #[test]
    fn test_restoring_twice_is_idempotent() {
        let _guard = UmaskGuard::set(0o027);
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("season")).unwrap();
        std::fs::write(dir.path().join("season/one"), b"x").unwrap();
        std::fs::write(dir.path().join("two"), b"x").unwrap();
        chmod(&dir.path().join("season/one"), 0o777);
        chmod(dir.path(), 0o2700);

        engine_for(dir.path()).execute().unwrap();
        let first = tree_modes(dir.path());
        engine_for(dir.path()).execute().unwrap();
        let second = tree_modes(dir.path());

        assert_eq!(first, second);
    }

    #[test]
    fn test_entries_beyond_a_symlink_are_left_alone() {
        let _guard = UmaskGuard::set(0o027);
        let outside = TempDir::new().unwrap();
        let secret = outside.path().join("secret");
        std::fs::write(&secret, b"x").unwrap();
        chmod(&secret, 0o604);

        let dir = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("escape")).unwrap();

        engine_for(dir.path()).execute().unwrap();

        assert_eq!(mode_of(&secret), 0o604);
    }

    #[test]
    fn test_broken_destination_link_aborts_without_mutation() {
        let _guard = UmaskGuard::set(0o027);
        let dir = TempDir::new().unwrap();
        let witness = dir.path().join("witness");
        std::fs::write(&witness, b"x").unwrap();
        chmod(&witness, 0o612);

        let link = dir.path().join("destination");
        std::os::unix::fs::symlink(dir.path().join("nowhere"), &link).unwrap();

        let err = engine_for(&link).execute().unwrap_err();
        assert!(matches!(err, RestoreError::Resolution { .. }));
        // nothing anywhere was touched
        assert_eq!(mode_of(&witness), 0o612);
    }

    #[test]
    fn test_destination_link_to_directory_is_resolved_once() {
        let _guard = UmaskGuard::set(0o022);
        let holder = TempDir::new().unwrap();
        let real = holder.path().join("real");
        std::fs::create_dir(&real).unwrap();
        std::fs::write(real.join("file"), b"x").unwrap();
        let link = holder.path().join("link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let report = engine_for(&link).execute().unwrap();

        assert_eq!(report.root, std::fs::canonicalize(&real).unwrap());
        assert_eq!(mode_of(&real.join("file")), 0o644);
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let _guard = UmaskGuard::set(0o027);
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, b"x").unwrap();
        chmod(&file, 0o777);

        let report = RestoreEngine::new(RestoreConfig {
            directory: dir.path().to_path_buf(),
            dry_run: true,
        })
        .execute()
        .unwrap();

        assert!(report.dry_run);
        assert_eq!(mode_of(&file), 0o777);
    }
}
