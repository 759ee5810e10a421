//! Error types for restoremod
//!
//! This module defines all error types used throughout the application.
//! Every failure is fatal to the run: the tree is left in a partially
//! restored but valid state, and re-running is idempotent.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for restore operations
#[derive(Error, Debug)]
pub enum RestoreError {
    /// Destination path unreachable, broken link, or not a directory
    #[error("cannot resolve destination '{}': {source}", .path.display())]
    Resolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Baseline metadata of the resolved destination could not be read
    #[error("cannot inspect baseline '{}': {source}", .path.display())]
    Inspection {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory could not be enumerated during the walk
    #[error("cannot enumerate directory '{}': {source}", .path.display())]
    Traversal {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A specific entry's mode/ACL write failed
    #[error("cannot restore permissions of '{}': {source}", .path.display())]
    Apply {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RestoreError {
    /// Create a resolution error with path context
    pub fn resolution(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Resolution {
            path: path.into(),
            source,
        }
    }

    /// Create an inspection error with path context
    pub fn inspection(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Inspection {
            path: path.into(),
            source,
        }
    }

    /// Create a traversal error with path context
    pub fn traversal(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Traversal {
            path: path.into(),
            source,
        }
    }

    /// Create an apply error with path context
    pub fn apply(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Apply {
            path: path.into(),
            source,
        }
    }

    /// Get the path this error is about
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Resolution { path, .. }
            | Self::Inspection { path, .. }
            | Self::Traversal { path, .. }
            | Self::Apply { path, .. } => path,
        }
    }

    /// Check if this error is a permission issue
    pub fn is_permission_error(&self) -> bool {
        let source = match self {
            Self::Resolution { source, .. }
            | Self::Inspection { source, .. }
            | Self::Traversal { source, .. }
            | Self::Apply { source, .. } => source,
        };
        source.kind() == std::io::ErrorKind::PermissionDenied
    }
}

/// Result type alias for restore operations
pub type Result<T> = std::result::Result<T, RestoreError>;
