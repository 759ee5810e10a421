//! Recursive directory traversal
//!
//! Yields the root first, then every descendant, exactly once each. The
//! tree was populated by an untrusted process, so descent is conservative:
//! each directory is opened with `O_NOFOLLOW` and pinned by its handle
//! while its children are listed, and symbolic links are yielded as plain
//! entries but never entered. The handle is released once the directory's
//! children are listed, before any descent, so at most one directory
//! handle is open at a time.

use crate::error::{RestoreError, Result};
use nix::dir::Dir;
use nix::fcntl::OFlag;
use nix::sys::stat::Mode;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::ffi::OsStr;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

/// Kind of a filesystem entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryKind {
    /// Anything that is neither a directory nor a symbolic link
    File,
    /// A directory
    Directory,
    /// A symbolic link (never followed)
    Symlink,
}

impl EntryKind {
    /// Classify a raw `st_mode`
    pub fn from_mode(raw_mode: u32) -> Self {
        match raw_mode & (libc::S_IFMT as u32) {
            x if x == libc::S_IFDIR as u32 => Self::Directory,
            x if x == libc::S_IFLNK as u32 => Self::Symlink,
            _ => Self::File,
        }
    }

    /// Check for a directory
    pub fn is_dir(self) -> bool {
        self == Self::Directory
    }

    /// Check for a symbolic link
    pub fn is_symlink(self) -> bool {
        self == Self::Symlink
    }
}

/// A single discovered entry, consumed immediately by the applier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsEntry {
    /// Absolute path of the entry
    pub path: PathBuf,
    /// Entry kind at discovery time
    pub kind: EntryKind,
    /// Permission bits (including setuid/setgid/sticky) at discovery time
    pub mode: u32,
}

/// Lazy depth-bounded tree traversal.
///
/// Single consumption is sufficient; constructing a new walker re-reads the
/// filesystem. Sibling order is unspecified.
pub struct TreeWalker {
    root: Option<PathBuf>,
    pending: Vec<PathBuf>,
    discovered: VecDeque<FsEntry>,
}

impl TreeWalker {
    /// Create a walker over `root` and everything beneath it
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            pending: Vec::new(),
            discovered: VecDeque::new(),
        }
    }

    fn stat_entry(path: PathBuf) -> Result<FsEntry> {
        let st = nix::sys::stat::lstat(&path)
            .map_err(|e| RestoreError::traversal(&path, errno_io(e)))?;
        let raw_mode = st.st_mode as u32;
        Ok(FsEntry {
            path,
            kind: EntryKind::from_mode(raw_mode),
            mode: raw_mode & 0o7777,
        })
    }

    /// List one directory through a pinned handle, queueing its children.
    ///
    /// The O_NOFOLLOW open guarantees a child listed as a directory cannot
    /// be swapped for a link and still be entered.
    fn list_directory(&mut self, dir_path: &Path) -> Result<()> {
        let mut handle = Dir::open(
            dir_path,
            OFlag::O_RDONLY | OFlag::O_DIRECTORY | OFlag::O_NOFOLLOW | OFlag::O_CLOEXEC,
            Mode::empty(),
        )
        .map_err(|e| RestoreError::traversal(dir_path, errno_io(e)))?;

        for dentry in handle.iter() {
            let dentry = dentry.map_err(|e| RestoreError::traversal(dir_path, errno_io(e)))?;
            let name = dentry.file_name().to_bytes();
            if matches!(name, b"." | b"..") {
                continue;
            }

            let child = dir_path.join(OsStr::from_bytes(name));
            let entry = Self::stat_entry(child)?;
            if entry.kind.is_dir() {
                self.pending.push(entry.path.clone());
            }
            self.discovered.push_back(entry);
        }

        Ok(())
    }
}

impl Iterator for TreeWalker {
    type Item = Result<FsEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(root) = self.root.take() {
            return Some(Self::stat_entry(root).map(|entry| {
                if entry.kind.is_dir() {
                    self.pending.push(entry.path.clone());
                }
                entry
            }));
        }

        loop {
            if let Some(entry) = self.discovered.pop_front() {
                return Some(Ok(entry));
            }
            let dir = self.pending.pop()?;
            if let Err(e) = self.list_directory(&dir) {
                return Some(Err(e));
            }
        }
    }
}

fn errno_io(errno: nix::errno::Errno) -> io::Error {
    io::Error::from_raw_os_error(errno as i32)
}
