/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for globe-adapter tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use globe_adapter::{ClientConfig, Credentials};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::HeaderMap;
use wiremock::MockServer;

pub const TEST_SECRET: &str = "c2VjcmV0";
pub const TEST_PASSPHRASE: &str = "correct-horse";
pub const TEST_API_KEY: &str = "k";

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

pub fn test_credentials() -> Credentials {
    Credentials::new(TEST_SECRET, TEST_PASSPHRASE).with_api_key(TEST_API_KEY)
}

/// Plain-text config pointing at a local address
pub fn local_config(addr: SocketAddr) -> ClientConfig {
    ClientConfig::default()
        .with_host(addr.to_string())
        .with_tls(false)
        .with_connection_timeout_ms(2_000)
}

enum ServerAction {
    Push(String),
    Close,
    /// Drop the TCP stream without a close frame
    Drop,
}

/// In-process WebSocket server handling one connection at a time
pub struct MockWsServer {
    pub addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    handshakes: Arc<Mutex<Vec<HeaderMap>>>,
    received: mpsc::UnboundedReceiver<String>,
    actions: mpsc::UnboundedSender<ServerAction>,
}

impl MockWsServer {
    pub async fn start() -> Self {
        Self::start_with_handshake_delay(Duration::ZERO).await
    }

    /// Like `start`, but each accepted socket waits `delay` before the
    /// WebSocket handshake is answered
    pub async fn start_with_handshake_delay(delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind ws listener");
        let addr = listener.local_addr().expect("local addr");
        let connections = Arc::new(AtomicUsize::new(0));
        let handshakes = Arc::new(Mutex::new(Vec::new()));
        let (received_tx, received) = mpsc::unbounded_channel();
        let (actions, mut action_rx) = mpsc::unbounded_channel();

        let connection_count = connections.clone();
        let captured = handshakes.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let captured = captured.clone();
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let accepted = accept_hdr_async(
                    stream,
                    move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
                        captured.lock().unwrap().push(request.headers().clone());
                        Ok(response)
                    },
                )
                .await;
                let Ok(ws) = accepted else {
                    continue;
                };
                connection_count.fetch_add(1, Ordering::SeqCst);
                let (mut write, mut read) = ws.split();

                loop {
                    tokio::select! {
                        action = action_rx.recv() => match action {
                            Some(ServerAction::Push(text)) => {
                                if write.send(Message::Text(text.into())).await.is_err() {
                                    break;
                                }
                            }
                            Some(ServerAction::Close) => {
                                let _ = write.send(Message::Close(None)).await;
                                break;
                            }
                            Some(ServerAction::Drop) => break,
                            None => return,
                        },
                        incoming = read.next() => match incoming {
                            Some(Ok(Message::Text(text))) => {
                                let _ = received_tx.send(text.to_string());
                            }
                            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                            Some(Ok(_)) => {}
                        },
                    }
                }
            }
        });

        Self {
            addr,
            connections,
            handshakes,
            received,
            actions,
        }
    }

    pub fn config(&self) -> ClientConfig {
        local_config(self.addr)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Headers of every completed handshake, oldest first
    pub fn handshake_headers(&self) -> Vec<HeaderMap> {
        self.handshakes.lock().unwrap().clone()
    }

    /// Push a text frame to the current connection
    pub fn push(&self, frame: serde_json::Value) {
        self.actions
            .send(ServerAction::Push(frame.to_string()))
            .expect("server task alive");
    }

    /// Close the current connection from the server side
    pub fn close_connection(&self) {
        self.actions.send(ServerAction::Close).expect("server task alive");
    }

    /// Drop the current connection abruptly, as a broken network would
    pub fn drop_connection(&self) {
        self.actions.send(ServerAction::Drop).expect("server task alive");
    }

    /// Next frame the client sent, parsed as JSON
    pub async fn next_frame(&mut self) -> serde_json::Value {
        let text = tokio::time::timeout(RECV_TIMEOUT, self.received.recv())
            .await
            .expect("timed out waiting for client frame")
            .expect("server task ended");
        serde_json::from_str(&text).expect("client frame is json")
    }
}

/// Accepts TCP connections and never answers the handshake
pub async fn start_silent_listener() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind silent listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });
    addr
}

/// An address nothing listens on
pub async fn refused_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
    addr
}

pub async fn recv_within<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("channel closed")
}

/// Poll until `check` holds or the timeout passes
pub async fn eventually<F: Fn() -> bool>(check: F) -> bool {
    let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
