//! Real-time clock sink
//!
//! Consumes each submission at the sample rate without producing sound.
//! Used when the daemon is built without hardware output and as the output
//! for playback tests.

use super::sink::AudioSink;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// What the sink was last asked to play
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionInfo {
    /// First sample of the submission (None for an empty one)
    pub first_sample: Option<i16>,
    /// Number of samples submitted
    pub len: usize,
}

struct Submission {
    buffer: Vec<i16>,
    len: usize,
    started: Instant,
    paused_for: Duration,
    paused_at: Option<Instant>,
    halted: bool,
}

impl Submission {
    fn position(&self, now: Instant) -> Duration {
        let end = self.paused_at.unwrap_or(now);
        end.saturating_duration_since(self.started)
            .saturating_sub(self.paused_for)
    }

    fn is_playing(&self, now: Instant, sample_rate: u32) -> bool {
        let length = Duration::from_secs_f64(self.len as f64 / sample_rate as f64);
        !self.halted && self.position(now) < length
    }
}

#[derive(Default)]
struct ClockState {
    current: Option<Submission>,
    submissions: u64,
    last: Option<SubmissionInfo>,
}

/// Sink that plays into a wall clock
pub struct ClockSink {
    sample_rate: u32,
    state: Mutex<ClockState>,
}

impl ClockSink {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            state: Mutex::new(ClockState::default()),
        }
    }

    /// Number of buffers submitted since creation
    pub fn submission_count(&self) -> u64 {
        self.lock().submissions
    }

    /// Details of the most recent submission
    pub fn last_submission(&self) -> Option<SubmissionInfo> {
        self.lock().last
    }

    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioSink for ClockSink {
    fn submit(&self, buffer: Vec<i16>, len: usize) -> Option<Vec<i16>> {
        let len = len.min(buffer.len());
        let mut state = self.lock();
        state.submissions += 1;
        state.last = Some(SubmissionInfo {
            first_sample: buffer[..len].first().copied(),
            len,
        });

        let previous = state.current.replace(Submission {
            buffer,
            len,
            started: Instant::now(),
            paused_for: Duration::ZERO,
            paused_at: None,
            halted: false,
        });
        previous.map(|s| s.buffer)
    }

    fn is_playing(&self) -> bool {
        let now = Instant::now();
        self.lock()
            .current
            .as_ref()
            .is_some_and(|s| s.is_playing(now, self.sample_rate))
    }

    fn is_paused(&self) -> bool {
        let now = Instant::now();
        self.lock()
            .current
            .as_ref()
            .is_some_and(|s| s.paused_at.is_some() && s.is_playing(now, self.sample_rate))
    }

    fn pause(&self) {
        let now = Instant::now();
        let mut state = self.lock();
        if let Some(current) = state.current.as_mut() {
            if current.paused_at.is_none() && current.is_playing(now, self.sample_rate) {
                current.paused_at = Some(now);
            }
        }
    }

    fn resume(&self) {
        let now = Instant::now();
        let mut state = self.lock();
        if let Some(current) = state.current.as_mut() {
            if let Some(paused_at) = current.paused_at.take() {
                current.paused_for += now.saturating_duration_since(paused_at);
            }
        }
    }

    fn halt(&self) {
        let mut state = self.lock();
        if let Some(current) = state.current.as_mut() {
            current.halted = true;
            current.paused_at = None;
        }
    }
}
