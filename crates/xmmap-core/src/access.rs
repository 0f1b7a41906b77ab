//! Descriptor and access permission definitions

use crate::{Error, Result};
use nix::errno::Errno;
use nix::sys::mman::{MapFlags, ProtFlags};
use nix::unistd::{sysconf, SysconfVar};
use std::os::fd::RawFd;

/// Backing object for a mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fd {
    /// No backing file; the mapping is anonymous
    Anonymous,
    /// Caller-owned descriptor; duplicated before mapping, never consumed
    File(RawFd),
}

impl Fd {
    /// Convert from a raw descriptor, where any negative value means anonymous
    pub fn from_raw(fd: RawFd) -> Self {
        if fd < 0 {
            Fd::Anonymous
        } else {
            Fd::File(fd)
        }
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Fd::Anonymous)
    }
}

/// Access permissions of a mapping, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Permissions {
    pub readable: bool,
    pub writable: bool,
    pub copy_on_write: bool,
}

impl Permissions {
    /// Derive permissions from the requested protection and mapping type.
    ///
    /// `flags` are the caller's flags; the anonymous bit has no bearing on
    /// copy-on-write, only the private/shared mapping type does.
    pub fn derive(prot: ProtFlags, flags: MapFlags) -> Self {
        let mapping_type = flags & (MapFlags::MAP_SHARED | MapFlags::MAP_PRIVATE);
        Self {
            readable: prot.contains(ProtFlags::PROT_READ),
            writable: prot.contains(ProtFlags::PROT_WRITE),
            copy_on_write: mapping_type == MapFlags::MAP_PRIVATE,
        }
    }
}

/// Host page size in bytes
pub fn page_size() -> Result<usize> {
    let size = sysconf(SysconfVar::PAGE_SIZE)
        .map_err(|e| Error::os("sysconf", e))?
        .ok_or(Error::os("sysconf", Errno::EINVAL))?;
    usize::try_from(size).map_err(|_| Error::os("sysconf", Errno::EINVAL))
}
