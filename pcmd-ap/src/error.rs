//! Error types for pcmd-ap
//!
//! Module-specific error types using thiserror. None of these ever reach the
//! wire: the protocol server turns every failure into a log line.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pcmd-ap
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Wire protocol errors
    #[error("Protocol error: {0}")]
    Protocol(#[from] pcmd_common::Error),

    /// Requested file could not be opened for playback
    #[error("Invalid file {}: {source}", path.display())]
    InvalidFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operation needs a loaded file but none is open
    #[error("No active session")]
    NoSession,

    /// Audio output device errors
    #[error("Audio output error: {0}")]
    AudioOutput(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using pcmd-ap Error
pub type Result<T> = std::result::Result<T, Error>;
