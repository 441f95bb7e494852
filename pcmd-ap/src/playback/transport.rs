//! Transport control
//!
//! Implements the six commands against the current playback session. Only
//! one session exists at a time; `play` replaces it, the other commands act
//! on whatever is loaded and are silently ignored when nothing is.

use super::engine::PlaybackEngine;
use super::session::PlaybackSession;
use crate::audio::AudioSink;
use crate::error::{Error, Result};
use pcmd_common::pcm::SeekTarget;
use pcmd_common::{Reply, Request};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on waiting for a seek from pause to reach the output
const SEEK_SETTLE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct TransportController {
    engine: PlaybackEngine,
    session: Option<Arc<PlaybackSession>>,
    root_folder: Option<PathBuf>,
}

impl TransportController {
    pub fn new(
        sink: Arc<dyn AudioSink>,
        poll_interval: Duration,
        root_folder: Option<PathBuf>,
    ) -> Self {
        Self {
            engine: PlaybackEngine::new(sink, poll_interval),
            session: None,
            root_folder,
        }
    }

    /// Execute one decoded request. Only queries produce a reply; failures
    /// are logged.
    pub fn handle(&mut self, request: Request) -> Option<Reply> {
        match request {
            Request::Play { filename } => {
                info!("Play {}", filename.display());
                if let Err(e) = self.play(&filename) {
                    warn!("Play failed: {}", e);
                }
                None
            }
            Request::Pause => {
                info!("Pause");
                self.pause();
                None
            }
            Request::Resume => {
                info!("Resume");
                self.resume();
                None
            }
            Request::Seek { timepoint } => {
                info!("Seek to {}s", timepoint);
                match self.seek(timepoint) {
                    Ok(()) => {}
                    Err(Error::NoSession) => debug!("Seek ignored, no file loaded"),
                    Err(e) => warn!("Seek to {}s failed: {}", timepoint, e),
                }
                None
            }
            Request::GetElapsed => {
                let elapsed = self.elapsed();
                debug!("Elapsed {}s", elapsed);
                Some(Reply::Seconds(elapsed))
            }
            Request::GetDuration => {
                let duration = self.duration();
                debug!("Duration {}s", duration);
                Some(Reply::Seconds(duration))
            }
        }
    }

    /// Start playing `filename` from the beginning.
    ///
    /// When the file cannot be opened the current session is left untouched.
    pub fn play(&mut self, filename: impl AsRef<Path>) -> Result<()> {
        let path = self.resolve(filename.as_ref());
        let file = File::open(&path).map_err(|source| Error::InvalidFile {
            path: path.clone(),
            source,
        })?;

        let session = Arc::new(PlaybackSession::new(
            path.display().to_string(),
            Box::new(file),
        ));
        self.engine.start(Arc::clone(&session))?;

        if let Some(previous) = self.session.replace(session) {
            debug!("Closed {}", previous.label());
        }
        Ok(())
    }

    /// Pause output; no-op unless a worker is running
    pub fn pause(&self) {
        if self.engine.is_running() {
            self.engine.sink().pause();
        }
    }

    /// Resume output; no-op unless a worker is running
    pub fn resume(&self) {
        if self.engine.is_running() {
            self.engine.sink().resume();
        }
    }

    /// Jump to `timepoint` seconds in the loaded file.
    ///
    /// Playback continues from the new position; if output was paused it is
    /// paused again once the new position reaches the output. A worker that
    /// already finished is restarted.
    pub fn seek(&mut self, timepoint: f32) -> Result<()> {
        let session = self.session.clone().ok_or(Error::NoSession)?;
        let target = SeekTarget::compute(timepoint, session.total_samples()?);
        if target.clamped {
            debug!(
                "Seek to {}s clamped to sample {} of {}",
                timepoint,
                target.sample,
                session.label()
            );
        }

        let sink = Arc::clone(self.engine.sink());
        let was_paused = sink.is_paused();

        // Halting inside the reposition drops whatever was queued from the
        // old position and clears the pause
        session.reposition(target.sample, || sink.halt())?;
        session.reset_elapsed(target.elapsed_nanos);

        if !self.engine.is_running() {
            debug!("Restarting worker for {}", session.label());
            self.engine.start(Arc::clone(&session))?;
        }

        if was_paused {
            if !self.engine.wait_for_playback(SEEK_SETTLE_TIMEOUT) {
                debug!("Seek target did not reach output before re-pausing");
            }
            sink.pause();
        }
        Ok(())
    }

    /// Seconds of audio played in the current session, 0.0 when none
    pub fn elapsed(&self) -> f32 {
        self.session
            .as_ref()
            .map_or(0.0, |session| session.elapsed_secs())
    }

    /// Length of the loaded file in seconds, 0.0 when none
    pub fn duration(&self) -> f32 {
        let Some(session) = self.session.as_ref() else {
            return 0.0;
        };
        session.duration_secs().unwrap_or_else(|e| {
            warn!("Could not read length of {}: {}", session.label(), e);
            0.0
        })
    }

    pub fn session(&self) -> Option<&Arc<PlaybackSession>> {
        self.session.as_ref()
    }

    /// True while the worker is streaming the current session
    pub fn is_playing(&self) -> bool {
        self.engine.is_running()
    }

    /// Stop playback and release the loaded file
    pub fn shutdown(&mut self) {
        self.engine.stop();
        self.engine.sink().halt();
        if let Some(session) = self.session.take() {
            info!("Released {}", session.label());
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match self.root_folder {
            Some(ref root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ClockSink;

    fn controller(root: Option<PathBuf>) -> TransportController {
        TransportController::new(
            Arc::new(ClockSink::new(44_100)),
            Duration::from_millis(5),
            root,
        )
    }

    #[test]
    fn test_queries_without_session() {
        let mut transport = controller(None);
        assert_eq!(transport.handle(Request::GetElapsed), Some(Reply::Seconds(0.0)));
        assert_eq!(transport.handle(Request::GetDuration), Some(Reply::Seconds(0.0)));
    }

    #[test]
    fn test_commands_without_session_are_ignored() {
        let mut transport = controller(None);
        assert_eq!(transport.handle(Request::Pause), None);
        assert_eq!(transport.handle(Request::Resume), None);
        assert_eq!(transport.handle(Request::Seek { timepoint: 3.0 }), None);
        assert!(matches!(transport.seek(3.0), Err(Error::NoSession)));
        assert!(transport.session().is_none());
    }

    #[test]
    fn test_missing_file_is_invalid() {
        let mut transport = controller(None);
        let result = transport.play("/nonexistent/pcmd/missing.pcm");
        assert!(matches!(result, Err(Error::InvalidFile { .. })));
        assert!(transport.session().is_none());
    }

    #[test]
    fn test_resolve_against_root_folder() {
        let transport = controller(Some(PathBuf::from("/srv/audio")));
        assert_eq!(
            transport.resolve(Path::new("a.pcm")),
            PathBuf::from("/srv/audio/a.pcm")
        );
        assert_eq!(
            transport.resolve(Path::new("/tmp/b.pcm")),
            PathBuf::from("/tmp/b.pcm")
        );

        let transport = controller(None);
        assert_eq!(transport.resolve(Path::new("a.pcm")), PathBuf::from("a.pcm"));
    }
}
