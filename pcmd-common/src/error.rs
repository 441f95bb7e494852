//! Common error types for PCMD

use thiserror::Error;

/// Common result type for PCMD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors shared by the daemon and clients
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// First byte of a request is not a known command tag
    #[error("Unknown command tag: {0}")]
    UnknownTag(u8),

    /// Filename does not fit the fixed-size PLAY payload
    #[error("Filename is {len} bytes, at most {max} allowed")]
    FilenameTooLong { len: usize, max: usize },

    /// Malformed payload or reply
    #[error("Protocol error: {0}")]
    Protocol(String),
}
