//! xmmap - Memory mapped regions with idempotent teardown

pub mod access;
pub mod conf;
pub mod error;
pub mod region;

pub use access::{page_size, Fd, Permissions};
pub use conf::RegionConf;
pub use error::{Error, Result};
pub use nix::sys::mman::{MapFlags, ProtFlags};
pub use region::{validate_len, Region};
