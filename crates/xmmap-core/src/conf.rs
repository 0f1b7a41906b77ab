//! Builder for mapping requests

use crate::access::Fd;
use crate::region::Region;
use crate::Result;
use nix::sys::mman::{MapFlags, ProtFlags};
use std::os::fd::{AsRawFd, RawFd};

/// Mapping request parameters
///
/// Defaults to a shared, read-write, anonymous mapping at offset 0.
#[derive(Debug, Clone, Copy)]
pub struct RegionConf {
    fd: Fd,
    len: usize,
    flags: MapFlags,
    prot: ProtFlags,
    offset: i64,
}

impl Default for RegionConf {
    fn default() -> Self {
        Self {
            fd: Fd::Anonymous,
            len: 0,
            flags: MapFlags::MAP_SHARED,
            prot: ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
            offset: 0,
        }
    }
}

impl RegionConf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back the mapping with a raw descriptor (negative means anonymous)
    pub fn fd(mut self, fd: RawFd) -> Self {
        self.fd = Fd::from_raw(fd);
        self
    }

    /// Back the mapping with an open file; the file stays owned by the caller
    pub fn file<F: AsRawFd>(self, file: &F) -> Self {
        self.fd(file.as_raw_fd())
    }

    /// Mapping length, 0 to map the rest of a regular file
    pub fn len(mut self, len: usize) -> Self {
        self.len = len;
        self
    }

    pub fn flags(mut self, flags: MapFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn prot(mut self, prot: ProtFlags) -> Self {
        self.prot = prot;
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Establish the mapping
    pub fn create(&self) -> Result<Region> {
        Region::create(self.fd, self.len, self.flags, self.prot, self.offset)
    }
}
