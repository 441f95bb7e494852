//! Integration tests for the control protocol server
//!
//! Runs the server on a loopback port and talks to it both through the
//! control client and with raw bytes.

mod helpers;

use helpers::{clock_transport, Fixtures};
use pcmd_ap::{ControlServer, SharedTransport};
use pcmd_common::ControlClient;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

struct TestServer {
    addr: SocketAddr,
    transport: SharedTransport,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<pcmd_ap::Result<()>>,
}

impl TestServer {
    async fn start(fixtures: &Fixtures, connection_timeout: Option<Duration>) -> Self {
        let (transport, _sink) = clock_transport(Some(fixtures.path()));
        let transport = Arc::new(Mutex::new(transport));

        let server = ControlServer::bind(
            "127.0.0.1:0".parse().unwrap(),
            Arc::clone(&transport),
            connection_timeout,
        )
        .await
        .expect("Failed to bind test server");
        let addr = server.local_addr().unwrap();

        let (stop, stopped) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.run(async move {
            let _ = stopped.await;
        }));

        Self {
            addr,
            transport,
            stop,
            handle,
        }
    }

    fn client(&self) -> ControlClient {
        ControlClient::new(self.addr).unwrap()
    }

    async fn shutdown(self) {
        let _ = self.stop.send(());
        self.handle.await.unwrap().unwrap();
        self.transport.lock().unwrap().shutdown();
    }
}

/// Run a blocking client call off the runtime threads
async fn blocking<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
    tokio::task::spawn_blocking(f).await.unwrap()
}

#[tokio::test]
async fn test_queries_with_nothing_loaded() {
    let fixtures = Fixtures::new();
    let server = TestServer::start(&fixtures, None).await;
    let client = server.client();

    let (elapsed, duration) =
        blocking(move || (client.elapsed().unwrap(), client.duration().unwrap())).await;
    assert_eq!(elapsed, 0.0);
    assert_eq!(duration, 0.0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_play_and_query_duration() {
    let fixtures = Fixtures::new();
    fixtures.ramp("two.pcm", 44_100 * 2);
    let server = TestServer::start(&fixtures, None).await;
    let client = server.client();

    let duration = blocking(move || {
        client.play("two.pcm").unwrap();
        client.duration().unwrap()
    })
    .await;
    assert_eq!(duration, 2.0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_seek_over_the_wire() {
    let fixtures = Fixtures::new();
    fixtures.ramp("ten.pcm", 44_100 * 10);
    let server = TestServer::start(&fixtures, None).await;
    let client = server.client();

    let elapsed = blocking(move || {
        client.play("ten.pcm").unwrap();
        client.pause().unwrap();
        client.seek(4.0).unwrap();
        client.elapsed().unwrap()
    })
    .await;
    assert!((elapsed - 4.0).abs() < 0.05, "elapsed {}", elapsed);

    server.shutdown().await;
}

#[tokio::test]
async fn test_reply_is_little_endian_float() {
    let fixtures = Fixtures::new();
    fixtures.ramp("half.pcm", 22_050);
    let server = TestServer::start(&fixtures, None).await;
    let client = server.client();
    blocking(move || client.play("half.pcm").unwrap()).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(&[5]).await.unwrap();
    let mut reply = Vec::new();
    stream.read_to_end(&mut reply).await.unwrap();
    assert_eq!(reply, 0.5f32.to_le_bytes());

    server.shutdown().await;
}

#[tokio::test]
async fn test_unknown_tag_closes_connection() {
    let fixtures = Fixtures::new();
    let server = TestServer::start(&fixtures, None).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.write_all(&[0x7f]).await.unwrap();
    let mut reply = Vec::new();
    let read = stream.read_to_end(&mut reply).await;
    assert!(read.is_err() || reply.is_empty());

    // Server still answers afterwards
    let client = server.client();
    let duration = blocking(move || client.duration().unwrap()).await;
    assert_eq!(duration, 0.0);

    server.shutdown().await;
}

#[tokio::test]
async fn test_truncated_request_times_out() {
    let fixtures = Fixtures::new();
    let server = TestServer::start(&fixtures, Some(Duration::from_millis(100))).await;

    // PLAY tag with only part of the filename field, then stall
    let mut stalled = TcpStream::connect(server.addr).await.unwrap();
    stalled.write_all(&[0, b'a', b'b']).await.unwrap();

    let client = server.client();
    let elapsed = blocking(move || client.elapsed().unwrap()).await;
    assert_eq!(elapsed, 0.0);
    assert!(server.transport.lock().unwrap().session().is_none());

    drop(stalled);
    server.shutdown().await;
}

#[tokio::test]
async fn test_missing_file_gets_no_reply() {
    let fixtures = Fixtures::new();
    let server = TestServer::start(&fixtures, None).await;
    let client = server.client();

    let duration = blocking(move || {
        client.play("missing.pcm").unwrap();
        client.duration().unwrap()
    })
    .await;
    assert_eq!(duration, 0.0);

    server.shutdown().await;
}
