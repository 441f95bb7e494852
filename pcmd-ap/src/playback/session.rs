//! Playback session state
//!
//! Everything bound to one open PCM source: the source handle itself, the
//! "permitted to run" flag of its worker, and the elapsed-time counter. The
//! session is shared between the control thread and the playback worker
//! through an `Arc`; all mutable state is behind a mutex or atomics.

use super::reader::{PcmSource, StreamReader};
use pcmd_common::pcm;
use std::io::{self, SeekFrom};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub struct PlaybackSession {
    label: String,
    source: Mutex<Box<dyn PcmSource>>,
    active: AtomicBool,
    elapsed_nanos: AtomicU64,
    /// Bumped on every reposition so stale chunks can be recognised
    epoch: AtomicU64,
}

impl PlaybackSession {
    /// Wrap an open source. Elapsed time starts at zero.
    pub fn new(label: impl Into<String>, source: Box<dyn PcmSource>) -> Self {
        Self {
            label: label.into(),
            source: Mutex::new(source),
            active: AtomicBool::new(false),
            elapsed_nanos: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
        }
    }

    /// Human-readable name of the source (for logging)
    pub fn label(&self) -> &str {
        &self.label
    }

    /// True while a worker exists and is permitted to keep running
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn set_active(&self, active: bool) {
        self.active.store(active, Ordering::Release);
    }

    pub fn elapsed_nanos(&self) -> u64 {
        self.elapsed_nanos.load(Ordering::Relaxed)
    }

    /// Elapsed playback time in seconds
    pub fn elapsed_secs(&self) -> f32 {
        pcm::nanos_to_secs(self.elapsed_nanos())
    }

    pub(crate) fn reset_elapsed(&self, nanos: u64) {
        self.elapsed_nanos.store(nanos, Ordering::Relaxed);
    }

    pub(crate) fn accrue(&self, played: Duration) {
        self.elapsed_nanos
            .fetch_add(played.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn byte_len(&self) -> io::Result<u64> {
        self.lock_source().byte_len()
    }

    pub fn total_samples(&self) -> io::Result<u64> {
        Ok(pcm::total_samples(self.byte_len()?))
    }

    /// Duration of the source in seconds
    pub fn duration_secs(&self) -> io::Result<f32> {
        Ok(pcm::duration_secs(self.byte_len()?))
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Move the read position to `sample`, then run `flush` before any
    /// chunk from the new position can be submitted.
    pub(crate) fn reposition(&self, sample: u64, flush: impl FnOnce()) -> io::Result<()> {
        let mut source = self.lock_source();
        source.seek(SeekFrom::Start(pcm::sample_to_byte(sample)))?;
        self.epoch.fetch_add(1, Ordering::AcqRel);
        flush();
        Ok(())
    }

    /// Read the next chunk. Returns the sample count and the epoch the read
    /// started in.
    pub(crate) fn read_chunk(
        &self,
        reader: &mut StreamReader,
        dest: &mut [i16],
    ) -> io::Result<(usize, u64)> {
        let mut source = self.lock_source();
        let epoch = self.epoch();
        let count = reader.read_chunk(&mut **source, dest)?;
        Ok((count, epoch))
    }

    /// Run `f` only if no reposition happened since `epoch`. Repositioning
    /// is blocked while `f` runs.
    pub(crate) fn if_current<R>(&self, epoch: u64, f: impl FnOnce() -> R) -> Option<R> {
        let _source = self.lock_source();
        (self.epoch() == epoch).then(f)
    }

    /// Deactivate at end of stream unless a reposition happened since
    /// `epoch`. Returns whether the session was deactivated.
    pub(crate) fn finish_if_current(&self, epoch: u64) -> bool {
        let _source = self.lock_source();
        if self.epoch() == epoch {
            self.set_active(false);
            true
        } else {
            false
        }
    }

    fn lock_source(&self) -> MutexGuard<'_, Box<dyn PcmSource>> {
        self.source.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .field("elapsed_nanos", &self.elapsed_nanos())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn session_with(samples: &[i16]) -> PlaybackSession {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        PlaybackSession::new("test", Box::new(Cursor::new(bytes)))
    }

    #[test]
    fn test_reposition_bumps_epoch_and_moves_reads() {
        let session = session_with(&[0, 1, 2, 3, 4]);
        let mut reader = StreamReader::new();
        let mut dest = [0i16; 2];

        let (count, epoch) = session.read_chunk(&mut reader, &mut dest).unwrap();
        assert_eq!((count, epoch), (2, 0));

        session.reposition(3, || ()).unwrap();
        assert_eq!(session.epoch(), 1);

        let (count, epoch) = session.read_chunk(&mut reader, &mut dest).unwrap();
        assert_eq!((count, epoch), (2, 1));
        assert_eq!(dest, [3, 4]);

        assert_eq!(session.if_current(0, || ()), None);
        assert_eq!(session.if_current(1, || 7), Some(7));

        session.set_active(true);
        assert!(!session.finish_if_current(0));
        assert!(session.is_active());
        assert!(session.finish_if_current(1));
        assert!(!session.is_active());
    }

    #[test]
    fn test_elapsed_counter() {
        let session = session_with(&[]);
        assert_eq!(session.elapsed_secs(), 0.0);

        session.accrue(Duration::from_millis(10));
        session.accrue(Duration::from_millis(10));
        assert_eq!(session.elapsed_nanos(), 20_000_000);

        session.reset_elapsed(1_500_000_000);
        assert_eq!(session.elapsed_secs(), 1.5);
    }

    #[test]
    fn test_duration_from_length() {
        let session = session_with(&vec![0; 44_100]);
        assert_eq!(session.total_samples().unwrap(), 44_100);
        assert_eq!(session.duration_secs().unwrap(), 1.0);
    }
}
