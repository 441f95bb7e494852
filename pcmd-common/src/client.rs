//! Control client for the playback daemon
//!
//! Each call opens a fresh connection, sends one request and, for query
//! commands, reads the 4-byte reply before the server closes the socket.

use crate::error::{Error, Result};
use crate::protocol::{Reply, Request};
use std::io::{Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Client for sending commands to a running daemon
#[derive(Debug, Clone)]
pub struct ControlClient {
    addr: SocketAddr,
    timeout: Option<Duration>,
}

impl ControlClient {
    /// Resolve `addr` once; connections are made per command.
    pub fn new<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let addr = addr
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| Error::Protocol("address resolved to nothing".to_string()))?;
        Ok(Self {
            addr,
            timeout: Some(Duration::from_secs(5)),
        })
    }

    /// Connect/read/write timeout (None = block indefinitely)
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn play(&self, filename: impl AsRef<Path>) -> Result<()> {
        self.send(&Request::Play {
            filename: filename.as_ref().to_path_buf(),
        })
        .map(|_| ())
    }

    pub fn pause(&self) -> Result<()> {
        self.send(&Request::Pause).map(|_| ())
    }

    pub fn resume(&self) -> Result<()> {
        self.send(&Request::Resume).map(|_| ())
    }

    pub fn seek(&self, timepoint: f32) -> Result<()> {
        self.send(&Request::Seek { timepoint }).map(|_| ())
    }

    /// Elapsed playback time in seconds
    pub fn elapsed(&self) -> Result<f32> {
        self.query(&Request::GetElapsed)
    }

    /// Duration of the current file in seconds (0.0 when nothing is loaded)
    pub fn duration(&self) -> Result<f32> {
        self.query(&Request::GetDuration)
    }

    // ===== Internal =====

    fn query(&self, request: &Request) -> Result<f32> {
        let reply = self.send(request)?;
        Reply::decode_seconds(&reply)
    }

    fn send(&self, request: &Request) -> Result<Vec<u8>> {
        let bytes = request.encode()?;
        let mut stream = match self.timeout {
            Some(timeout) => TcpStream::connect_timeout(&self.addr, timeout)?,
            None => TcpStream::connect(self.addr)?,
        };
        stream.set_read_timeout(self.timeout)?;
        stream.set_write_timeout(self.timeout)?;
        stream.set_nodelay(true)?;

        debug!("Sending {} to {}", request.tag(), self.addr);
        stream.write_all(&bytes)?;
        stream.flush()?;

        let mut reply = vec![0u8; request.tag().reply_len()];
        if !reply.is_empty() {
            stream.read_exact(&mut reply)?;
        }

        // Server closes after replying; ignore a peer that already did
        let _ = stream.shutdown(Shutdown::Both);
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn test_query_reads_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut tag = [0u8; 1];
            conn.read_exact(&mut tag).unwrap();
            conn.write_all(&Reply::Seconds(12.5).encode()).unwrap();
            tag[0]
        });

        let client = ControlClient::new(addr).unwrap();
        assert_eq!(client.duration().unwrap(), 12.5);
        assert_eq!(server.join().unwrap(), 5);
    }

    #[test]
    fn test_play_sends_full_payload() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (mut conn, _) = listener.accept().unwrap();
            let mut buf = Vec::new();
            conn.read_to_end(&mut buf).unwrap();
            buf
        });

        ControlClient::new(addr).unwrap().play("track.pcm").unwrap();
        let received = server.join().unwrap();
        assert_eq!(received.len(), 129);
        assert_eq!(&received[1..10], b"track.pcm");
    }

    #[test]
    fn test_too_long_filename_never_connects() {
        // Nothing listens here; the encode error must come first
        let client = ControlClient::new("127.0.0.1:9").unwrap();
        let result = client.play(&"a".repeat(200));
        assert!(matches!(result, Err(Error::FilenameTooLong { .. })));
    }
}
