//! Front/back sample buffers
//!
//! Two equally sized buffers whose ownership alternates between the playback
//! worker and the sink. The back buffer is filled by the reader; `swap_into`
//! moves it into the sink and takes the sink's previous buffer as the new
//! back buffer, so the buffer being played is never the one being written.

use crate::audio::AudioSink;
use tracing::debug;

pub struct DoubleBuffer {
    capacity: usize,
    back: Vec<i16>,
    /// Front buffer before its first trip to the sink
    spare: Option<Vec<i16>>,
}

impl DoubleBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            back: vec![0; capacity],
            spare: Some(vec![0; capacity]),
        }
    }

    /// Buffer the reader fills next
    pub fn back_mut(&mut self) -> &mut [i16] {
        &mut self.back
    }

    /// Hand the first `len` samples of the back buffer to `sink` for playback
    pub fn swap_into(&mut self, sink: &dyn AudioSink, len: usize) {
        let filled = std::mem::take(&mut self.back);
        let returned = sink.submit(filled, len).or_else(|| self.spare.take());

        self.back = match returned {
            Some(buffer) if buffer.len() == self.capacity => buffer,
            _ => {
                debug!("Sink returned no reusable buffer, allocating {} samples", self.capacity);
                vec![0; self.capacity]
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::ClockSink;

    #[test]
    fn test_swap_alternates_two_buffers() {
        let sink = ClockSink::new(44_100);
        let mut buffers = DoubleBuffer::new(4);

        buffers.back_mut().copy_from_slice(&[1, 1, 1, 1]);
        buffers.swap_into(&sink, 4);
        // The back buffer is now the untouched spare
        assert_eq!(buffers.back_mut(), &[0, 0, 0, 0]);

        buffers.back_mut().copy_from_slice(&[2, 2, 2, 2]);
        buffers.swap_into(&sink, 4);
        // The first buffer came back from the sink
        assert_eq!(buffers.back_mut(), &[1, 1, 1, 1]);
        assert_eq!(sink.submission_count(), 2);
    }
}
