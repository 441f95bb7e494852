//! # PCM Audio Player (pcmd-ap)
//!
//! Network-controlled playback daemon for headerless 16-bit mono PCM files.
//!
//! **Architecture:** a TCP control server feeds decoded requests to the
//! [`TransportController`](playback::TransportController), which owns the
//! current playback session and a single streaming worker thread. The worker
//! double-buffers 2-second chunks into an [`AudioSink`](audio::AudioSink).

pub mod audio;
pub mod config;
pub mod error;
pub mod library;
pub mod playback;
pub mod server;

pub use error::{Error, Result};
pub use playback::TransportController;
pub use server::{ControlServer, SharedTransport};
