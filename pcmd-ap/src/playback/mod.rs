//! Streaming playback engine and transport control

pub mod buffers;
pub mod engine;
pub mod reader;
pub mod session;
pub mod transport;

pub use buffers::DoubleBuffer;
pub use engine::PlaybackEngine;
pub use reader::{PcmSource, StreamReader};
pub use session::PlaybackSession;
pub use transport::TransportController;
