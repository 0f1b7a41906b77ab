//! Mapped region lifecycle

use crate::access::{Fd, Permissions};
use crate::{Error, Result};
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg};
use nix::libc;
use nix::sys::mman::{MapFlags, ProtFlags};
use nix::sys::stat::{fstat, SFlag};
use nix::unistd::close;
use std::os::fd::RawFd;
use std::ptr;
use tracing::{debug, trace, warn};

/// Descriptor value held once the region owns no descriptor
const NO_FD: RawFd = -1;

/// Resolve the mapping length against a regular file's size.
///
/// A `length` of zero maps everything from `offset` to end of file.
pub fn validate_len(file_size: u64, length: usize, offset: u64) -> Result<usize> {
    if length == 0 {
        if file_size == 0 {
            return Err(Error::InvalidArgument("cannot mmap an empty file"));
        }
        if offset >= file_size {
            return Err(Error::InvalidArgument(
                "mmap offset is greater than file size",
            ));
        }
        return usize::try_from(file_size - offset)
            .map_err(|_| Error::InvalidArgument("mmap length is too large"));
    }
    if offset > file_size || file_size - offset < length as u64 {
        return Err(Error::InvalidArgument(
            "mmap length is greater than file size",
        ));
    }
    Ok(length)
}

/// A live (or released) memory mapping and the descriptor backing it
///
/// The region exclusively owns both the address range and its duplicated
/// descriptor. [`Region::teardown`] releases them and may be called any
/// number of times; dropping the region tears it down as well.
#[derive(Debug)]
pub struct Region {
    /// Start of the mapping, null once released
    address: *mut u8,
    /// Mapping length in bytes
    len: usize,
    /// Duplicated descriptor, `NO_FD` for anonymous or closed
    fd: RawFd,
    /// Access permissions
    permissions: Permissions,
    /// Whether the mapping has been unmapped
    released: bool,
}

// Safety: the region is the sole owner of its mapping and descriptor, and
// teardown requires `&mut self`
unsafe impl Send for Region {}
unsafe impl Sync for Region {}

impl Region {
    /// Map `length` bytes of `fd` starting at `offset`
    ///
    /// With [`Fd::Anonymous`] the anonymous flag is forced on and no file
    /// size logic applies. Otherwise the descriptor is duplicated with
    /// close-on-exec, and for regular files the length is inferred or
    /// bounds-checked against the file size.
    pub fn create(
        fd: Fd,
        length: usize,
        flags: MapFlags,
        prot: ProtFlags,
        offset: i64,
    ) -> Result<Self> {
        let (length, map_flags, map_fd) = match fd {
            Fd::File(src) => {
                let length = match (fstat(src), u64::try_from(offset)) {
                    (Ok(stat), Ok(file_offset)) if is_regular(stat.st_mode) => {
                        let resolved = validate_len(stat.st_size as u64, length, file_offset)?;
                        trace!(fd = src, size = stat.st_size, length = resolved, "resolved mmap length");
                        resolved
                    }
                    // Devices, pipes and unstattable descriptors have no meaningful size;
                    // negative offsets are left for mmap to reject
                    _ => length,
                };
                let dup = fcntl(src, FcntlArg::F_DUPFD_CLOEXEC(0))
                    .map_err(|e| Error::os("dup", e))?;
                (length, flags, dup)
            }
            Fd::Anonymous => (length, flags | MapFlags::MAP_ANONYMOUS, NO_FD),
        };

        let address = unsafe {
            libc::mmap(
                ptr::null_mut(),
                length,
                prot.bits(),
                map_flags.bits(),
                map_fd,
                offset as libc::off_t,
            )
        };
        if address == libc::MAP_FAILED {
            let errno = Errno::last();
            if map_fd != NO_FD {
                let _ = close(map_fd);
            }
            return Err(Error::os("mmap", errno));
        }

        let region = Self {
            address: address.cast(),
            len: length,
            fd: map_fd,
            permissions: Permissions::derive(prot, flags),
            released: false,
        };
        debug!(address = ?region.address, len = length, fd = map_fd, "mapped region");
        Ok(region)
    }

    /// Release the descriptor and the mapping
    ///
    /// A close failure is reported but never retried; the unmap still runs.
    /// An unmap failure leaves the region live so a later call can retry.
    pub fn teardown(&mut self) -> Result<()> {
        let closed = if self.fd != NO_FD {
            let fd = std::mem::replace(&mut self.fd, NO_FD);
            close(fd).map_err(|e| Error::os("close", e))
        } else {
            Ok(())
        };

        if !self.released {
            let ret = unsafe { libc::munmap(self.address.cast(), self.len) };
            if ret != 0 {
                let errno = Errno::last();
                if let Err(e) = &closed {
                    warn!(error = %e, "descriptor close failed before unmap failure");
                }
                return Err(Error::os("munmap", errno));
            }
            debug!(address = ?self.address, len = self.len, "unmapped region");
            self.address = ptr::null_mut();
            self.released = true;
        }

        closed
    }

    /// Start of the mapping, null once released
    pub fn address(&self) -> *const u8 {
        self.address
    }

    /// Mapping length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Descriptor owned by this region, if any
    pub fn fd(&self) -> Option<RawFd> {
        (self.fd != NO_FD).then_some(self.fd)
    }

    pub fn permissions(&self) -> Permissions {
        self.permissions
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Get a slice view of the mapping
    pub fn as_slice(&self) -> Result<&[u8]> {
        if self.released {
            return Err(Error::Released);
        }
        if !self.permissions.readable {
            return Err(Error::NotReadable);
        }
        Ok(unsafe { std::slice::from_raw_parts(self.address, self.len) })
    }

    /// Get a mutable slice view of the mapping (requires write permission)
    pub fn as_mut_slice(&mut self) -> Result<&mut [u8]> {
        if self.released {
            return Err(Error::Released);
        }
        if !self.permissions.writable {
            return Err(Error::ReadOnly);
        }
        if !self.permissions.readable {
            return Err(Error::NotReadable);
        }
        Ok(unsafe { std::slice::from_raw_parts_mut(self.address, self.len) })
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!(error = %e, "failed to tear down region on drop");
        }
    }
}

fn is_regular(mode: libc::mode_t) -> bool {
    SFlag::from_bits_truncate(mode) & SFlag::S_IFMT == SFlag::S_IFREG
}
