//! Shared fixtures for playback integration tests

#![allow(dead_code)]

use pcmd_ap::audio::ClockSink;
use pcmd_ap::TransportController;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Directory of PCM fixtures, removed on drop
pub struct Fixtures {
    dir: TempDir,
}

impl Fixtures {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create fixture dir"),
        }
    }

    /// Write `samples` samples where sample `i` has value `i as i16`
    pub fn ramp(&self, name: &str, samples: usize) -> PathBuf {
        let bytes: Vec<u8> = (0..samples)
            .flat_map(|i| (i as i16).to_le_bytes())
            .collect();
        self.raw(name, &bytes)
    }

    /// Write arbitrary bytes
    pub fn raw(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("Failed to create fixture");
        file.write_all(bytes).expect("Failed to write fixture");
        path
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }
}

/// Controller playing into a clock sink the test keeps a handle to
pub fn clock_transport(root: Option<PathBuf>) -> (TransportController, Arc<ClockSink>) {
    let sink = Arc::new(ClockSink::new(44_100));
    let transport = TransportController::new(sink.clone(), POLL_INTERVAL, root);
    (transport, sink)
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}
