//! Audio sink interface
//!
//! A sink plays one submitted buffer at a time, asynchronously. Buffers are
//! moved in on `submit` and handed back on the next `submit`, so the engine
//! never writes to memory the output is still reading.

/// Snapshot of sink status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkStatus {
    /// Nothing submitted, or the last submission finished or was halted
    Idle,
    /// Submission in progress
    Playing,
    /// Submission in progress but paused
    Paused,
}

/// Output the playback engine feeds
pub trait AudioSink: Send + Sync {
    /// Start playing `buffer[..len]` and return immediately.
    ///
    /// Any current submission is replaced and the paused flag cleared. The
    /// buffer submitted previously is returned to the caller.
    fn submit(&self, buffer: Vec<i16>, len: usize) -> Option<Vec<i16>>;

    /// True while the current submission has unplayed samples (also when paused)
    fn is_playing(&self) -> bool;

    /// True while the current submission is paused
    fn is_paused(&self) -> bool;

    /// Pause the current submission; no-op when idle
    fn pause(&self);

    /// Resume a paused submission; no-op otherwise
    fn resume(&self);

    /// End the current submission immediately
    fn halt(&self);

    fn status(&self) -> SinkStatus {
        if self.is_paused() {
            SinkStatus::Paused
        } else if self.is_playing() {
            SinkStatus::Playing
        } else {
            SinkStatus::Idle
        }
    }
}
