//! POSIX.1e ACL support
//!
//! Model and wire codec for POSIX access control lists as stored by Linux
//! in the `system.posix_acl_access` and `system.posix_acl_default` extended
//! attributes. The codec speaks the kernel's binary layout directly: a
//! 4-byte little-endian version header followed by 8-byte entries
//! (u16 tag, u16 permissions, u32 qualifier id).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
#[cfg(unix)]
use std::path::Path;

/// Extended attribute holding the access ACL of an entry
pub const ACL_ACCESS_XATTR: &str = "system.posix_acl_access";

/// Extended attribute holding the default ACL of a directory
pub const ACL_DEFAULT_XATTR: &str = "system.posix_acl_default";

/// Version header of the on-disk ACL representation
const ACL_XATTR_VERSION: u32 = 2;

/// Qualifier id used by entries that do not name a specific user or group
const ACL_UNDEFINED_ID: u32 = u32::MAX;

/// ACL entry tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AclTag {
    /// Permissions of the owning user
    UserObj,
    /// Permissions of a named user
    User,
    /// Permissions of the owning group
    GroupObj,
    /// Permissions of a named group
    Group,
    /// Upper bound for all group-class entries
    Mask,
    /// Permissions of everyone else
    Other,
}

impl AclTag {
    const RAW_USER_OBJ: u16 = 0x01;
    const RAW_USER: u16 = 0x02;
    const RAW_GROUP_OBJ: u16 = 0x04;
    const RAW_GROUP: u16 = 0x08;
    const RAW_MASK: u16 = 0x10;
    const RAW_OTHER: u16 = 0x20;

    /// Parse a wire tag value
    pub fn from_raw(raw: u16) -> Option<Self> {
        match raw {
            Self::RAW_USER_OBJ => Some(Self::UserObj),
            Self::RAW_USER => Some(Self::User),
            Self::RAW_GROUP_OBJ => Some(Self::GroupObj),
            Self::RAW_GROUP => Some(Self::Group),
            Self::RAW_MASK => Some(Self::Mask),
            Self::RAW_OTHER => Some(Self::Other),
            _ => None,
        }
    }

    /// Wire tag value
    pub fn to_raw(self) -> u16 {
        match self {
            Self::UserObj => Self::RAW_USER_OBJ,
            Self::User => Self::RAW_USER,
            Self::GroupObj => Self::RAW_GROUP_OBJ,
            Self::Group => Self::RAW_GROUP,
            Self::Mask => Self::RAW_MASK,
            Self::Other => Self::RAW_OTHER,
        }
    }

    /// Whether entries with this tag carry a user/group id qualifier
    pub fn is_qualified(self) -> bool {
        matches!(self, Self::User | Self::Group)
    }
}

/// A single ACL entry: tag, optional qualifier, permission bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    /// Entry tag
    pub tag: AclTag,
    /// User or group id for `User`/`Group` entries
    pub qualifier: Option<u32>,
    /// Permission bits (read/write/execute)
    pub perms: u16,
}

impl AclEntry {
    /// Read permission
    pub const READ: u16 = 0o4;
    /// Write permission
    pub const WRITE: u16 = 0o2;
    /// Execute permission
    pub const EXECUTE: u16 = 0o1;

    /// Create an unqualified entry
    pub fn new(tag: AclTag, perms: u16) -> Self {
        Self {
            tag,
            qualifier: None,
            perms,
        }
    }

    /// Create a qualified entry for a named user or group
    pub fn qualified(tag: AclTag, id: u32, perms: u16) -> Self {
        Self {
            tag,
            qualifier: Some(id),
            perms,
        }
    }

    fn rwx(&self) -> String {
        let mut s = String::with_capacity(3);
        s.push(if self.perms & Self::READ != 0 { 'r' } else { '-' });
        s.push(if self.perms & Self::WRITE != 0 { 'w' } else { '-' });
        s.push(if self.perms & Self::EXECUTE != 0 { 'x' } else { '-' });
        s
    }
}

impl fmt::Display for AclEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.tag {
            AclTag::UserObj | AclTag::User => "user",
            AclTag::GroupObj | AclTag::Group => "group",
            AclTag::Mask => "mask",
            AclTag::Other => "other",
        };
        match self.qualifier {
            Some(id) => write!(f, "{}:{}:{}", kind, id, self.rwx()),
            None => write!(f, "{}::{}", kind, self.rwx()),
        }
    }
}

/// An ordered POSIX.1e access control list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosixAcl {
    /// Entries in on-disk order
    pub entries: Vec<AclEntry>,
}

impl PosixAcl {
    /// Create an ACL from entries
    pub fn new(entries: Vec<AclEntry>) -> Self {
        Self { entries }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the ACL has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check for a mask entry
    pub fn has_mask(&self) -> bool {
        self.entries.iter().any(|e| e.tag == AclTag::Mask)
    }

    /// Check whether the ACL goes beyond the three standard classes
    /// (owner/group/other) implied by plain mode bits
    pub fn is_extended(&self) -> bool {
        self.entries
            .iter()
            .any(|e| !matches!(e.tag, AclTag::UserObj | AclTag::GroupObj | AclTag::Other))
    }

    /// Decode the kernel xattr representation
    pub fn decode(bytes: &[u8]) -> io::Result<Self> {
        if bytes.len() < 4 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "ACL attribute shorter than its version header",
            ));
        }
        let version = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if version != ACL_XATTR_VERSION {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("unsupported ACL attribute version {}", version),
            ));
        }
        let body = &bytes[4..];
        if body.len() % 8 != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "truncated ACL entry",
            ));
        }

        let mut entries = Vec::with_capacity(body.len() / 8);
        for chunk in body.chunks_exact(8) {
            let raw_tag = u16::from_le_bytes([chunk[0], chunk[1]]);
            let perms = u16::from_le_bytes([chunk[2], chunk[3]]) & 0o7;
            let id = u32::from_le_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);

            let tag = AclTag::from_raw(raw_tag).ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("unknown ACL entry tag {:#x}", raw_tag),
                )
            })?;

            let qualifier = if tag.is_qualified() && id != ACL_UNDEFINED_ID {
                Some(id)
            } else {
                None
            };

            entries.push(AclEntry {
                tag,
                qualifier,
                perms,
            });
        }

        Ok(Self { entries })
    }

    /// Encode into the kernel xattr representation
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.entries.len() * 8);
        out.extend_from_slice(&ACL_XATTR_VERSION.to_le_bytes());
        for entry in &self.entries {
            out.extend_from_slice(&entry.tag.to_raw().to_le_bytes());
            out.extend_from_slice(&entry.perms.to_le_bytes());
            let id = entry.qualifier.unwrap_or(ACL_UNDEFINED_ID);
            out.extend_from_slice(&id.to_le_bytes());
        }
        out
    }
}

impl fmt::Display for PosixAcl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// Errno values that mean "nothing there to read or remove"
#[cfg(unix)]
fn is_absent_or_unsupported(err: &io::Error) -> bool {
    matches!(
        err.raw_os_error(),
        Some(libc::ENODATA) | Some(libc::ENOTSUP)
    )
}

/// Read the default ACL of a directory, if any.
///
/// Returns `Ok(None)` when the attribute is absent or the filesystem has no
/// ACL support; either way there is nothing to inherit.
#[cfg(unix)]
pub fn read_default_acl(path: &Path) -> io::Result<Option<PosixAcl>> {
    match xattr::get(path, ACL_DEFAULT_XATTR) {
        Ok(Some(bytes)) => PosixAcl::decode(&bytes).map(Some),
        Ok(None) => Ok(None),
        Err(e) if is_absent_or_unsupported(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Read the access ACL of an entry, if it carries one beyond its mode bits
#[cfg(unix)]
pub fn read_access_acl(path: &Path) -> io::Result<Option<PosixAcl>> {
    match xattr::get(path, ACL_ACCESS_XATTR) {
        Ok(Some(bytes)) => PosixAcl::decode(&bytes).map(Some),
        Ok(None) => Ok(None),
        Err(e) if is_absent_or_unsupported(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Write the access ACL of an entry
#[cfg(unix)]
pub fn write_access_acl(path: &Path, acl: &PosixAcl) -> io::Result<()> {
    xattr::set(path, ACL_ACCESS_XATTR, &acl.encode())
}

/// Write the default ACL of a directory
#[cfg(unix)]
pub fn write_default_acl(path: &Path, acl: &PosixAcl) -> io::Result<()> {
    xattr::set(path, ACL_DEFAULT_XATTR, &acl.encode())
}

/// Remove both ACL attributes from an entry, leaving only the three
/// standard permission classes implied by its mode bits.
///
/// An absent attribute and a filesystem without ACL support both already
/// satisfy that state and are not errors.
#[cfg(unix)]
pub fn remove_extended_acls(path: &Path) -> io::Result<()> {
    for name in [ACL_ACCESS_XATTR, ACL_DEFAULT_XATTR] {
        match xattr::remove(path, name) {
            Ok(()) => {}
            Err(e) if is_absent_or_unsupported(&e) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
