//! Hardware audio output using cpal
//!
//! Opens the output device once at startup (44.1kHz, fixed buffer size) and
//! feeds the current submission from the device callback. Mono samples are
//! copied to every device channel.

use super::sink::AudioSink;
use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, Sample, SampleFormat, SizedSample, Stream, StreamConfig};
use pcmd_common::pcm::SAMPLE_RATE;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

/// Read position inside the current submission
#[derive(Default)]
struct Playhead {
    buffer: Option<Vec<i16>>,
    len: usize,
    pos: usize,
    paused: bool,
}

impl Playhead {
    fn next_sample(&mut self) -> i16 {
        if self.paused || self.pos >= self.len {
            return 0;
        }
        let sample = self
            .buffer
            .as_ref()
            .and_then(|b| b.get(self.pos).copied())
            .unwrap_or(0);
        self.pos += 1;
        sample
    }

    fn is_playing(&self) -> bool {
        self.buffer.is_some() && self.pos < self.len
    }
}

// cpal::Stream is !Send/Sync on some platforms; it is only touched on drop.
struct StreamHolder(Stream);
unsafe impl Send for StreamHolder {}
unsafe impl Sync for StreamHolder {}

/// Audio sink backed by a cpal output stream
pub struct DeviceSink {
    playhead: Arc<Mutex<Playhead>>,
    device_name: String,
    _stream: StreamHolder,
}

impl DeviceSink {
    /// Open audio device for output.
    ///
    /// # Arguments
    /// - `device_name`: Optional device name (None = default device)
    /// - `buffer_frames`: Device buffer size in frames
    ///
    /// Falls back to the default device when the named one is not found.
    pub fn open(device_name: Option<String>, buffer_frames: u32) -> Result<Self> {
        let host = cpal::default_host();

        let device = match device_name.as_ref() {
            Some(name) => {
                let mut devices = host
                    .output_devices()
                    .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;
                match devices.find(|d| d.name().ok().as_ref() == Some(name)) {
                    Some(dev) => dev,
                    None => {
                        warn!("Requested device '{}' not found, falling back to default device", name);
                        host.default_output_device().ok_or_else(|| {
                            Error::AudioOutput(format!(
                                "Device '{}' not found and no default device available",
                                name
                            ))
                        })?
                    }
                }
            }
            None => host
                .default_output_device()
                .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?,
        };
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let (mut config, sample_format) = Self::get_config(&device)?;
        config.buffer_size = cpal::BufferSize::Fixed(buffer_frames);
        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}, buffer_size={:?}",
            config.sample_rate.0, config.channels, sample_format, config.buffer_size
        );

        let playhead = Arc::new(Mutex::new(Playhead::default()));

        let stream = match sample_format {
            SampleFormat::I16 => Self::build_stream::<i16>(&device, &config, &playhead)?,
            SampleFormat::F32 => Self::build_stream::<f32>(&device, &config, &playhead)?,
            other => {
                return Err(Error::AudioOutput(format!("Unsupported sample format: {:?}", other)));
            }
        };
        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;

        info!("Audio stream started on {}", device_name);
        Ok(Self {
            playhead,
            device_name,
            _stream: StreamHolder(stream),
        })
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Pick a 44.1kHz configuration, preferring i16 samples
    fn get_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
        let supported: Vec<_> = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?
            .filter(|c| c.min_sample_rate().0 <= SAMPLE_RATE && c.max_sample_rate().0 >= SAMPLE_RATE)
            .collect();

        let chosen = [SampleFormat::I16, SampleFormat::F32]
            .iter()
            .find_map(|format| supported.iter().find(|c| c.sample_format() == *format))
            .ok_or_else(|| {
                Error::AudioOutput(format!("Device cannot play {} Hz i16/f32 audio", SAMPLE_RATE))
            })?;

        let sample_format = chosen.sample_format();
        let config = chosen
            .clone()
            .with_sample_rate(cpal::SampleRate(SAMPLE_RATE))
            .config();
        Ok((config, sample_format))
    }

    fn build_stream<T>(
        device: &Device,
        config: &StreamConfig,
        playhead: &Arc<Mutex<Playhead>>,
    ) -> Result<Stream>
    where
        T: SizedSample + FromSample<i16>,
    {
        let channels = config.channels as usize;
        let playhead = Arc::clone(playhead);

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let mut head = lock(&playhead);
                    for frame in data.chunks_mut(channels) {
                        let value = T::from_sample(head.next_sample());
                        frame.fill(value);
                    }
                },
                move |err| error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
    }
}

fn lock(playhead: &Mutex<Playhead>) -> MutexGuard<'_, Playhead> {
    playhead.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AudioSink for DeviceSink {
    fn submit(&self, buffer: Vec<i16>, len: usize) -> Option<Vec<i16>> {
        let mut head = lock(&self.playhead);
        head.len = len.min(buffer.len());
        head.pos = 0;
        head.paused = false;
        head.buffer.replace(buffer)
    }

    fn is_playing(&self) -> bool {
        lock(&self.playhead).is_playing()
    }

    fn is_paused(&self) -> bool {
        let head = lock(&self.playhead);
        head.paused && head.is_playing()
    }

    fn pause(&self) {
        let mut head = lock(&self.playhead);
        if head.is_playing() {
            head.paused = true;
        }
    }

    fn resume(&self) {
        lock(&self.playhead).paused = false;
    }

    fn halt(&self) {
        let mut head = lock(&self.playhead);
        head.pos = head.len;
        head.paused = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playhead_outputs_silence_when_paused_or_done() {
        let mut head = Playhead {
            buffer: Some(vec![5, 6, 7]),
            len: 2,
            pos: 0,
            paused: false,
        };

        assert_eq!(head.next_sample(), 5);
        head.paused = true;
        assert_eq!(head.next_sample(), 0);
        head.paused = false;
        assert_eq!(head.next_sample(), 6);
        // Samples past `len` are never played
        assert_eq!(head.next_sample(), 0);
        assert!(!head.is_playing());
    }
}
