//! Control protocol server
//!
//! Accepts one TCP connection at a time, reads a single request, executes it
//! on the transport controller and writes the reply if the command has one.
//! Per-connection failures (bad tag, short read, timeout) are logged and the
//! connection dropped; the accept loop itself only ends on shutdown.

use crate::error::{Error, Result};
use crate::playback::TransportController;
use pcmd_common::{Request, Tag};
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Transport controller shared between the server and the daemon shutdown path
pub type SharedTransport = Arc<Mutex<TransportController>>;

pub struct ControlServer {
    listener: TcpListener,
    transport: SharedTransport,
    connection_timeout: Option<Duration>,
}

impl ControlServer {
    /// Bind the listening socket
    pub async fn bind(
        addr: SocketAddr,
        transport: SharedTransport,
        connection_timeout: Option<Duration>,
    ) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            Error::Io(io::Error::new(e.kind(), format!("Failed to bind {}: {}", addr, e)))
        })?;
        Ok(Self {
            listener,
            transport,
            connection_timeout,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve connections until `shutdown` completes
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!("Control server listening on {}", self.local_addr()?);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Control server stopping");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        debug!("Connection from {}", peer);
                        if let Err(e) = self.serve_connection(stream).await {
                            warn!("Request from {} dropped: {}", peer, e);
                        }
                    }
                    Err(e) => warn!("Accept failed: {}", e),
                },
            }
        }

        Ok(())
    }

    async fn serve_connection(&self, mut stream: TcpStream) -> Result<()> {
        let request = self.bounded(read_request(&mut stream)).await?;
        debug!("Received {}", request.tag());

        let transport = Arc::clone(&self.transport);
        let reply = tokio::task::spawn_blocking(move || {
            transport
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .handle(request)
        })
        .await
        .map_err(|e| Error::Internal(format!("Request handler failed: {}", e)))?;

        if let Some(reply) = reply {
            let bytes = reply.encode();
            self.bounded(async {
                stream.write_all(&bytes).await?;
                Ok::<_, Error>(())
            })
            .await?;
        }

        // The client may already be gone; the request has been handled
        let _ = stream.shutdown().await;
        Ok(())
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.connection_timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                Error::Io(io::Error::new(
                    io::ErrorKind::TimedOut,
                    format!("no complete request within {:?}", limit),
                ))
            })?,
            None => fut.await,
        }
    }
}

/// Read one tag byte and its fixed-size payload
async fn read_request(stream: &mut TcpStream) -> Result<Request> {
    let mut tag = [0u8; 1];
    stream.read_exact(&mut tag).await?;
    let tag = Tag::try_from(tag[0])?;

    let mut payload = vec![0u8; tag.payload_len()];
    stream.read_exact(&mut payload).await?;
    Ok(Request::decode(tag, &payload)?)
}
