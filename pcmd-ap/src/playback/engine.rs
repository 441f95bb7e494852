//! Playback engine
//!
//! Owns the single playback worker thread. The worker streams one session's
//! source to the sink chunk by chunk: read into the back buffer, wait for the
//! sink to drain the previous chunk, swap buffers and submit, and account the
//! time actually played into the session's elapsed counter. It exits at end of
//! stream, on a read error, or when the session is deactivated.
//!
//! Starting a new session always stops and joins the previous worker first,
//! so at most one worker exists at any time.

use super::buffers::DoubleBuffer;
use super::reader::StreamReader;
use super::session::PlaybackSession;
use crate::audio::{AudioSink, SinkStatus};
use crate::error::{Error, Result};
use pcmd_common::pcm::CHUNK_SAMPLES;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

struct Worker {
    session: Arc<PlaybackSession>,
    handle: JoinHandle<DoubleBuffer>,
}

pub struct PlaybackEngine {
    sink: Arc<dyn AudioSink>,
    poll_interval: Duration,
    worker: Option<Worker>,
    /// Buffers parked between workers
    buffers: Option<DoubleBuffer>,
}

impl PlaybackEngine {
    pub fn new(sink: Arc<dyn AudioSink>, poll_interval: Duration) -> Self {
        Self {
            sink,
            poll_interval,
            worker: None,
            buffers: None,
        }
    }

    pub fn sink(&self) -> &Arc<dyn AudioSink> {
        &self.sink
    }

    /// True while a worker exists and its session is still active
    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|worker| worker.session.is_active())
    }

    /// Spawn a worker streaming `session`, replacing any previous worker
    pub fn start(&mut self, session: Arc<PlaybackSession>) -> Result<()> {
        self.stop();

        let buffers = self
            .buffers
            .take()
            .unwrap_or_else(|| DoubleBuffer::new(CHUNK_SAMPLES));

        session.set_active(true);
        let context = WorkerContext {
            session: Arc::clone(&session),
            sink: Arc::clone(&self.sink),
            poll_interval: self.poll_interval,
        };

        let handle = thread::Builder::new()
            .name("pcmd-playback".to_string())
            .spawn(move || context.run(buffers))
            .map_err(|e| {
                session.set_active(false);
                Error::Internal(format!("Failed to spawn playback worker: {}", e))
            })?;

        debug!("Playback worker spawned for {}", session.label());
        self.worker = Some(Worker { session, handle });
        Ok(())
    }

    /// Deactivate the current worker, wait for it to exit and drop whatever
    /// it left on the sink. Idempotent.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        worker.session.set_active(false);
        match worker.handle.join() {
            Ok(buffers) => self.buffers = Some(buffers),
            Err(_) => error!("Playback worker for {} panicked", worker.session.label()),
        }
        // The last chunk may still be queued or paused on the output
        self.sink.halt();
        debug!("Playback worker for {} joined", worker.session.label());
    }

    /// Block until the sink reports an unpaused submission in progress.
    ///
    /// Gives up when the worker exits or `timeout` passes. Returns whether
    /// playback was observed.
    pub fn wait_for_playback(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.sink.status() == SinkStatus::Playing {
                return true;
            }
            if !self.is_running() || Instant::now() >= deadline {
                return false;
            }
            thread::sleep(self.poll_interval);
        }
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

struct WorkerContext {
    session: Arc<PlaybackSession>,
    sink: Arc<dyn AudioSink>,
    poll_interval: Duration,
}

impl WorkerContext {
    fn run(self, mut buffers: DoubleBuffer) -> DoubleBuffer {
        let mut reader = StreamReader::new();
        let label = self.session.label().to_string();
        info!("Streaming {}", label);

        while self.session.is_active() {
            let (count, epoch) = match self.session.read_chunk(&mut reader, buffers.back_mut()) {
                Ok(read) => read,
                Err(e) => {
                    warn!("Read from {} failed: {}", label, e);
                    self.session.set_active(false);
                    break;
                }
            };

            if count == 0 {
                // Let the final chunk play out
                self.wait_while_busy();
                if self.session.finish_if_current(epoch) {
                    debug!("End of stream for {}", label);
                    break;
                }
                continue;
            }

            // Wait for the previous chunk before replacing it
            self.wait_while_busy();
            if !self.session.is_active() {
                break;
            }

            let submitted = self
                .session
                .if_current(epoch, || buffers.swap_into(self.sink.as_ref(), count));
            if submitted.is_none() {
                debug!("Discarding chunk read before reposition");
            }
        }

        debug!("Playback worker for {} finished", label);
        buffers
    }

    /// Poll the sink until its current submission ends, accruing played time
    fn wait_while_busy(&self) {
        while self.session.is_active() {
            match self.sink.status() {
                SinkStatus::Idle => return,
                SinkStatus::Paused => thread::sleep(self.poll_interval),
                SinkStatus::Playing => {
                    thread::sleep(self.poll_interval);
                    self.session.accrue(self.poll_interval);
                }
            }
        }
    }
}
