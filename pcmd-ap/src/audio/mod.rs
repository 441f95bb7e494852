//! Audio output
//!
//! The playback engine talks to output through [`AudioSink`]; the daemon
//! picks a hardware sink when built with the `device` feature and falls back
//! to the real-time [`ClockSink`] otherwise.

pub mod clock;
#[cfg(feature = "device")]
pub mod device;
pub mod sink;

pub use clock::ClockSink;
#[cfg(feature = "device")]
pub use device::DeviceSink;
pub use sink::{AudioSink, SinkStatus};

use crate::config::Config;
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

/// Open the output sink the daemon plays through
#[cfg(feature = "device")]
pub fn open_sink(config: &Config) -> Result<Arc<dyn AudioSink>> {
    let sink = DeviceSink::open(config.device.clone(), config.buffer_frames)?;
    info!("Audio output opened on {}", sink.device_name());
    Ok(Arc::new(sink))
}

/// Open the output sink the daemon plays through
#[cfg(not(feature = "device"))]
pub fn open_sink(config: &Config) -> Result<Arc<dyn AudioSink>> {
    if let Some(ref name) = config.device {
        tracing::warn!(
            "Output device '{}' requested but hardware output is not compiled in",
            name
        );
    }
    info!("Built without the `device` feature, using clock output (audio is discarded)");
    Ok(Arc::new(ClockSink::new(pcmd_common::pcm::SAMPLE_RATE)))
}
