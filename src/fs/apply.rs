//! Per-entry permission restoration
//!
//! One branch is selected once from the baseline and executed for every
//! entry; nothing is re-decided per entry. Each entry is re-checked
//! immediately before writing: link modes cannot be written, and an entry
//! swapped for a symbolic link between discovery and mutation must be
//! skipped rather than followed.

use crate::error::{RestoreError, Result};
use crate::fs::acl::{self, PosixAcl};
use crate::fs::inspect::{Baseline, RestoreMode};
use crate::fs::walker::{EntryKind, FsEntry};
use std::io;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

const SETUID: u32 = libc::S_ISUID as u32;
const SETGID: u32 = libc::S_ISGID as u32;
const STICKY: u32 = libc::S_ISVTX as u32;

/// Creation template for regular files (read+write)
const FILE_TEMPLATE: u32 = 0o666;

/// Creation template for directories (read+write+execute)
const DIR_TEMPLATE: u32 = 0o777;

/// Mode bits for ACL-inheritance restoration: keep the entry's permission
/// bits, clear setuid and sticky unconditionally, force setgid from the
/// baseline. Applies to every entry kind.
pub fn inherit_mode_bits(current: u32, setgid: bool) -> u32 {
    let cleared = current & !(SETUID | SETGID | STICKY);
    if setgid {
        cleared | SETGID
    } else {
        cleared
    }
}

/// Mode bits for process-based restoration: mask the kind-appropriate
/// creation template with the captured umask, then force setgid from the
/// baseline. The umask pass never touches setgid; setuid and sticky are
/// absent from the templates and end up clear.
pub fn umask_mode_bits(kind: EntryKind, umask: u32, setgid: bool) -> u32 {
    let template = if kind.is_dir() {
        DIR_TEMPLATE
    } else {
        FILE_TEMPLATE
    };
    let perms = template & !umask;
    if setgid {
        perms | SETGID
    } else {
        perms
    }
}

/// Applies the baseline's restoration rule to one entry at a time.
pub struct PermissionApplier {
    baseline: Baseline,
    dry_run: bool,
}

impl PermissionApplier {
    /// Create an applier for a fixed baseline
    pub fn new(baseline: Baseline) -> Self {
        Self {
            baseline,
            dry_run: false,
        }
    }

    /// Compute and log every change without writing anything
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The baseline this applier restores from
    pub fn baseline(&self) -> &Baseline {
        &self.baseline
    }

    /// Restore one entry. Exactly one rule executes, chosen by the
    /// baseline; the entry's kind and current bits are re-read here so the
    /// write matches what is on disk now, not what was discovered.
    pub fn apply(&self, entry: &FsEntry) -> Result<()> {
        let metadata = std::fs::symlink_metadata(&entry.path)
            .map_err(|e| RestoreError::apply(&entry.path, e))?;
        let raw_mode = metadata.permissions().mode();
        let kind = EntryKind::from_mode(raw_mode);

        if kind.is_symlink() {
            tracing::debug!("skipping symbolic link {}", entry.path.display());
            return Ok(());
        }

        match &self.baseline.mode {
            RestoreMode::AclInheritance(default_acl) => {
                self.apply_inherited(&entry.path, kind, raw_mode & 0o7777, default_acl)
            }
            RestoreMode::ProcessBased { umask } => self.apply_process(&entry.path, kind, *umask),
        }
    }

    fn apply_inherited(
        &self,
        path: &Path,
        kind: EntryKind,
        current: u32,
        default_acl: &PosixAcl,
    ) -> Result<()> {
        let mode = inherit_mode_bits(current, self.baseline.setgid);

        if self.dry_run {
            tracing::info!(
                "would set {} to mode {:04o}, ACL {}",
                path.display(),
                mode,
                default_acl
            );
            return Ok(());
        }

        if mode != current {
            chmod(path, mode).map_err(|e| RestoreError::apply(path, e))?;
        }
        acl::write_access_acl(path, default_acl).map_err(|e| RestoreError::apply(path, e))?;
        if kind.is_dir() {
            // Only directories inherit; files never receive a default ACL
            acl::write_default_acl(path, default_acl)
                .map_err(|e| RestoreError::apply(path, e))?;
        }

        tracing::debug!("restored {} from default ACL", path.display());
        Ok(())
    }

    fn apply_process(&self, path: &Path, kind: EntryKind, umask: u32) -> Result<()> {
        let mode = umask_mode_bits(kind, umask, self.baseline.setgid);

        if self.dry_run {
            tracing::info!(
                "would set {} to mode {:04o} and drop extended ACLs",
                path.display(),
                mode
            );
            return Ok(());
        }

        // Certain archive formats preserve ACLs through extraction
        acl::remove_extended_acls(path).map_err(|e| RestoreError::apply(path, e))?;
        chmod(path, mode).map_err(|e| RestoreError::apply(path, e))?;

        tracing::debug!("restored {} to mode {:04o}", path.display(), mode);
        Ok(())
    }
}

fn chmod(path: &Path, mode: u32) -> io::Result<()> {
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}
