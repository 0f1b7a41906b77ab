//! Error types for xmmap

use nix::errno::Errno;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    InvalidArgument(&'static str),

    #[error("{op} failed: {source}")]
    Os {
        op: &'static str,
        #[source]
        source: Errno,
    },

    #[error("mmap closed or invalid")]
    Released,

    #[error("access denied: mapping is read-only")]
    ReadOnly,

    #[error("access denied: mapping is not readable")]
    NotReadable,
}

impl Error {
    pub(crate) fn os(op: &'static str, source: Errno) -> Self {
        Error::Os { op, source }
    }

    /// Platform error code for OS failures
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Error::Os { source, .. } => Some(*source as i32),
            _ => None,
        }
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
