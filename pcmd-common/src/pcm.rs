//! PCM format constants and position arithmetic
//!
//! Input files are raw signed 16-bit little-endian mono samples at 44.1kHz
//! with no header, so every duration and position is derived from byte
//! length alone.

use std::time::Duration;

/// Playback sample rate (Hz)
pub const SAMPLE_RATE: u32 = 44_100;

/// Size of one sample on disk
pub const BYTES_PER_SAMPLE: u64 = 2;

/// Samples per chunk handed to the sink (2 seconds of audio)
pub const CHUNK_SAMPLES: usize = SAMPLE_RATE as usize * 2;

/// Interval at which the playback worker polls sink status
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Number of whole samples in a file of `byte_len` bytes
pub fn total_samples(byte_len: u64) -> u64 {
    byte_len / BYTES_PER_SAMPLE
}

/// Duration in seconds of a file of `byte_len` bytes
pub fn duration_secs(byte_len: u64) -> f32 {
    (total_samples(byte_len) as f64 / SAMPLE_RATE as f64) as f32
}

/// Byte offset of a sample index
pub fn sample_to_byte(sample: u64) -> u64 {
    sample * BYTES_PER_SAMPLE
}

/// Time position of a sample index, in nanoseconds
pub fn sample_to_nanos(sample: u64) -> u64 {
    (sample as f64 * NANOS_PER_SEC / SAMPLE_RATE as f64).round() as u64
}

/// Convert seconds to nanoseconds, saturating negatives to zero
pub fn secs_to_nanos(secs: f64) -> u64 {
    if secs.is_nan() || secs <= 0.0 {
        0
    } else {
        (secs * NANOS_PER_SEC).round() as u64
    }
}

/// Convert a nanosecond counter to seconds for the wire
pub fn nanos_to_secs(nanos: u64) -> f32 {
    (nanos as f64 / NANOS_PER_SEC) as f32
}

/// Where a seek request lands
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekTarget {
    /// Sample index the source is repositioned to
    pub sample: u64,

    /// Value the elapsed-time counter is reset to
    pub elapsed_nanos: u64,

    /// True when the requested time fell outside the file
    pub clamped: bool,
}

impl SeekTarget {
    /// Compute the seek target for `timepoint` seconds in a file of
    /// `total_samples` samples.
    ///
    /// The sample index is `round(timepoint * SAMPLE_RATE)` clamped to
    /// `[0, total_samples - 1]`. Elapsed time keeps the requested value when
    /// it is inside the file and otherwise follows the clamped sample, so the
    /// advisory clock never points past what is actually playing.
    pub fn compute(timepoint: f32, total_samples: u64) -> Self {
        let last = total_samples.saturating_sub(1);
        let requested = timepoint as f64 * SAMPLE_RATE as f64;

        if requested.is_nan() || requested < 0.0 {
            return Self {
                sample: 0,
                elapsed_nanos: 0,
                clamped: true,
            };
        }

        let rounded = requested.round();
        if rounded > last as f64 {
            return Self {
                sample: last,
                elapsed_nanos: sample_to_nanos(last),
                clamped: true,
            };
        }

        Self {
            sample: rounded as u64,
            elapsed_nanos: secs_to_nanos(timepoint as f64),
            clamped: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_is_two_seconds() {
        assert_eq!(CHUNK_SAMPLES, 88_200);
    }

    #[test]
    fn test_duration_from_byte_length() {
        // 10 seconds of mono 16-bit audio
        assert_eq!(duration_secs(882_000), 10.0);
        assert_eq!(duration_secs(0), 0.0);
        // Odd trailing byte does not count as a sample
        assert_eq!(total_samples(5), 2);
    }

    #[test]
    fn test_seek_in_range_keeps_requested_time() {
        let target = SeekTarget::compute(1.5, 441_000);
        assert_eq!(target.sample, 66_150);
        assert_eq!(target.elapsed_nanos, 1_500_000_000);
        assert!(!target.clamped);
    }

    #[test]
    fn test_seek_rounds_to_nearest_sample() {
        // 0.00001s * 44100 = 0.441 -> 0, 0.00002s -> 0.882 -> 1
        assert_eq!(SeekTarget::compute(0.000_01, 100).sample, 0);
        assert_eq!(SeekTarget::compute(0.000_02, 100).sample, 1);
    }

    #[test]
    fn test_seek_past_end_clamps_to_last_sample() {
        let target = SeekTarget::compute(100.0, 44_100);
        assert_eq!(target.sample, 44_099);
        assert_eq!(target.elapsed_nanos, sample_to_nanos(44_099));
        assert!(target.clamped);
        assert!(nanos_to_secs(target.elapsed_nanos) < 1.0);
    }

    #[test]
    fn test_seek_negative_clamps_to_start() {
        let target = SeekTarget::compute(-3.0, 44_100);
        assert_eq!(target.sample, 0);
        assert_eq!(target.elapsed_nanos, 0);
    }

    #[test]
    fn test_seek_in_empty_file() {
        let target = SeekTarget::compute(2.0, 0);
        assert_eq!(target.sample, 0);
        assert_eq!(target.elapsed_nanos, 0);
    }

    #[test]
    fn test_nanos_seconds_conversion() {
        assert_eq!(secs_to_nanos(2.25), 2_250_000_000);
        assert_eq!(secs_to_nanos(-1.0), 0);
        assert_eq!(nanos_to_secs(750_000_000), 0.75);
        assert_eq!(sample_to_byte(44_100), 88_200);
    }
}
