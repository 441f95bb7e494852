//! # PCMD Common Library
//!
//! Shared code for the PCM playback daemon and its clients:
//! - PCM format constants and position/duration arithmetic
//! - Wire protocol (command tags, request payloads, replies)
//! - Synchronous control client
//! - Common error types

pub mod client;
pub mod error;
pub mod pcm;
pub mod protocol;

pub use client::ControlClient;
pub use error::{Error, Result};
pub use protocol::{Reply, Request, Tag};
