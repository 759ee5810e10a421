//! Baseline inspection
//!
//! Reads the resolved destination's permission metadata once and decides
//! which inheritance model governs the whole tree. The decision is never
//! revisited: the walk rewrites the root's own bits, so re-deriving the
//! baseline mid-run would corrupt the contract.

use crate::error::{RestoreError, Result};
use crate::fs::acl::{self, PosixAcl};
use nix::sys::stat::Mode;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// Which inheritance model governs the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestoreMode {
    /// The root carries a default ACL; propagate it to every entry
    AclInheritance(PosixAcl),
    /// No default ACL; rebuild permissions from creation templates and the
    /// process umask captured at inspection time
    ProcessBased {
        /// Permission bits masked out of the creation templates
        umask: u32,
    },
}

impl RestoreMode {
    /// Short human-readable label for logging
    pub fn label(&self) -> &'static str {
        match self {
            Self::AclInheritance(_) => "default ACL",
            Self::ProcessBased { .. } => "process umask",
        }
    }
}

/// Immutable ground truth for the run, computed exactly once before any
/// mutation and held fixed while the tree (root included) is rewritten.
#[derive(Debug, Clone)]
pub struct Baseline {
    /// The inheritance model and its parameters
    pub mode: RestoreMode,
    /// The root's setgid bit, propagated to every entry
    pub setgid: bool,
}

/// Inspect the resolved destination root and build the [`Baseline`].
pub fn inspect(root: &Path) -> Result<Baseline> {
    let metadata =
        std::fs::symlink_metadata(root).map_err(|e| RestoreError::inspection(root, e))?;
    let setgid = metadata.permissions().mode() & (libc::S_ISGID as u32) != 0;

    let default_acl =
        acl::read_default_acl(root).map_err(|e| RestoreError::inspection(root, e))?;

    let mode = match default_acl {
        Some(acl) if !acl.is_empty() => RestoreMode::AclInheritance(acl),
        _ => RestoreMode::ProcessBased {
            umask: current_umask(),
        },
    };

    Ok(Baseline { mode, setgid })
}

/// Capture the calling process's umask, permission bits only.
///
/// umask(2) can only be read by writing, so the value is swapped out and
/// immediately restored.
pub fn current_umask() -> u32 {
    let prev = nix::sys::stat::umask(Mode::empty());
    nix::sys::stat::umask(prev);
    prev.bits() as u32 & 0o777
}

/// Serializes tests that touch the process-wide umask, restoring the
/// previous value on drop.
#[cfg(test)]
pub(crate) mod umask_guard {
    use nix::sys::stat::Mode;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    static UMASK_LOCK: Mutex<()> = Mutex::new(());

    pub(crate) struct UmaskGuard {
        prev: Mode,
        _lock: MutexGuard<'static, ()>,
    }

    impl UmaskGuard {
        pub(crate) fn set(mask: u32) -> Self {
            let lock = UMASK_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            let prev = nix::sys::stat::umask(Mode::from_bits_truncate(mask as libc::mode_t));
            Self { prev, _lock: lock }
        }
    }

    impl Drop for UmaskGuard {
        fn drop(&mut self) {
            nix::sys::stat::umask(self.prev);
        }
    }
}
