//! # restoremod - Permission Restoration for Completed Downloads
//!
//! restoremod restores a consistent, predictable permission state on a
//! directory tree that was just populated by an external, untrusted
//! process (a download or archive extraction). It inspects the destination
//! directory once, decides which of two inheritance models governs the
//! tree, and applies that model uniformly to the destination and every
//! descendant.
//!
//! ## Restoration models
//!
//! - **Default ACL**: if the destination carries a default ACL, every entry
//!   receives that ACL as its access ACL (directories also as their default
//!   ACL), with the destination's setgid bit propagated and setuid/sticky
//!   bits cleared.
//! - **Process umask**: otherwise, permissions are rebuilt from the
//!   standard creation templates (0666 for files, 0777 for directories)
//!   masked by the process umask, the setgid bit is propagated, and any
//!   extended ACLs left behind by archive extraction are discarded.
//!
//! The pass is strictly sequential and aborts at the first unfixable
//! entry; re-running from the same destination is idempotent, so a
//! partially restored tree is always a safe intermediate state.
//!
//! ## Quick Start
//!
//! ```no_run
//! use restoremod::config::RestoreConfig;
//! use restoremod::core::RestoreEngine;
//! use std::path::PathBuf;
//!
//! let config = RestoreConfig {
//!     directory: PathBuf::from("/srv/downloads/item"),
//!     dry_run: false,
//! };
//!
//! let report = RestoreEngine::new(config).execute().unwrap();
//! report.print_summary();
//! ```
//!
//! ## Hook invocation
//!
//! The binary is designed to run as a post-processing hook: the download
//! manager exports `RESTOREMOD_DIRECTORY` (and optionally
//! `RESTOREMOD_STATUS`), and the exit code reports success, failure, or
//! nothing-to-do back to the manager.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod error;
pub mod fs;

// Re-export commonly used types
pub use config::{PostProcessStatus, RestoreConfig};
pub use core::{RestoreEngine, RestoreReport};
pub use error::{RestoreError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports
pub mod prelude {
    //! Convenient re-exports for common usage
    //!
    //! ```no_run
    //! use restoremod::prelude::*;
    //! ```

    pub use crate::config::{CliArgs, PostProcessStatus, RestoreConfig};
    pub use crate::core::{RestoreEngine, RestoreReport};
    pub use crate::error::{RestoreError, Result};
    pub use crate::fs::{
        inspect, resolve, AclEntry, AclTag, Baseline, EntryKind, FsEntry, PermissionApplier,
        PosixAcl, RestoreMode, TreeWalker,
    };
}
