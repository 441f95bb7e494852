//! Stream reader
//!
//! Sequential reader over an open PCM source producing fixed-size chunks of
//! signed 16-bit little-endian samples.

use pcmd_common::pcm::{BYTES_PER_SAMPLE, CHUNK_SAMPLES};
use std::fs::File;
use std::io::{self, Cursor, Read, Seek};

/// Seekable byte stream holding raw PCM
pub trait PcmSource: Read + Seek + Send {
    /// Total length of the source in bytes
    fn byte_len(&mut self) -> io::Result<u64>;
}

impl PcmSource for File {
    fn byte_len(&mut self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }
}

impl<T: AsRef<[u8]> + Send> PcmSource for Cursor<T> {
    fn byte_len(&mut self) -> io::Result<u64> {
        Ok(self.get_ref().as_ref().len() as u64)
    }
}

/// Chunk reader with a reusable byte scratch buffer
pub struct StreamReader {
    scratch: Vec<u8>,
}

impl StreamReader {
    pub fn new() -> Self {
        Self {
            scratch: vec![0; CHUNK_SAMPLES * BYTES_PER_SAMPLE as usize],
        }
    }

    /// Fill `dest` with the next samples from `source`.
    ///
    /// Returns the number of samples read. Reads keep going until `dest` is
    /// full or the source is exhausted, so a short count only happens on the
    /// final chunk. Zero means end of stream. A trailing odd byte is dropped.
    pub fn read_chunk<R: Read + ?Sized>(
        &mut self,
        source: &mut R,
        dest: &mut [i16],
    ) -> io::Result<usize> {
        let want = dest.len() * BYTES_PER_SAMPLE as usize;
        if self.scratch.len() < want {
            self.scratch.resize(want, 0);
        }
        let bytes = &mut self.scratch[..want];

        let mut filled = 0;
        while filled < want {
            match source.read(&mut bytes[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }

        let samples = filled / BYTES_PER_SAMPLE as usize;
        for (sample, pair) in dest.iter_mut().zip(bytes[..samples * 2].chunks_exact(2)) {
            *sample = i16::from_le_bytes([pair[0], pair[1]]);
        }
        Ok(samples)
    }
}

impl Default for StreamReader {
    fn default() -> Self {
        Self::new()
    }
}
