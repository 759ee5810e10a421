//! File system operations module
//!
//! Destination resolution, baseline inspection, directory traversal, and
//! the per-entry permission/ACL mutations.

pub mod acl;
pub mod apply;
pub mod inspect;
pub mod resolve;
pub mod walker;

pub use acl::{AclEntry, AclTag, PosixAcl};
pub use apply::{inherit_mode_bits, umask_mode_bits, PermissionApplier};
pub use inspect::{current_umask, inspect, Baseline, RestoreMode};
pub use resolve::resolve;
pub use walker::{EntryKind, FsEntry, TreeWalker};
