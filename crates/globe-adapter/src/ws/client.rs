/*
[INPUT]:  Client configuration, optional credentials, topic handlers
[OUTPUT]: A single duplex connection with routed channel callbacks
[POS]:    WebSocket layer - connection lifecycle and outbound frames
[UPDATE]: When changing handshake, lifecycle states or the I/O task
*/

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::{Mutex as AsyncMutex, mpsc};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use super::dispatch::{DispatchOutcome, Dispatcher, ErrorHandler};
use super::message::{ChannelMessage, Command};
use super::registry::SubscriptionRegistry;
use super::topic::Topic;
use crate::auth::{RequestDescriptor, RequestSigner};
use crate::config::{ClientConfig, WS_PATH};
use crate::error::{GlobeError, Result};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Lifecycle of the duplex connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    /// Never connected
    #[default]
    Idle,
    Connecting,
    Open,
    /// Closed locally or by the server
    Closed,
    /// Handshake failed, timed out, or the transport broke
    Errored,
}

#[derive(Debug)]
struct Connection {
    id: u64,
    outbound: mpsc::UnboundedSender<WsMessage>,
}

#[derive(Debug, Default)]
struct Shared {
    state: ConnectionState,
    connection: Option<Connection>,
}

/// WebSocket client for the Globe exchange
///
/// Handlers registered with [`GlobeWebSocket::subscribe`] survive reconnects;
/// the exchange forgets subscriptions when a connection drops, so callers
/// resubscribe after reconnecting.
pub struct GlobeWebSocket {
    config: ClientConfig,
    signer: Option<RequestSigner>,
    registry: Arc<SubscriptionRegistry>,
    dispatcher: Arc<Dispatcher>,
    shared: Arc<Mutex<Shared>>,
    connect_gate: AsyncMutex<()>,
    next_connection_id: AtomicU64,
}

impl GlobeWebSocket {
    /// Build a client; credentials in the config make the handshake signed
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let signer = config
            .credentials
            .clone()
            .map(RequestSigner::new)
            .transpose()?;
        let registry = Arc::new(SubscriptionRegistry::new());
        let dispatcher = Arc::new(Dispatcher::new(registry.clone(), default_error_handler()));

        Ok(Self {
            config,
            signer,
            registry,
            dispatcher,
            shared: Arc::new(Mutex::new(Shared::default())),
            connect_gate: AsyncMutex::new(()),
            next_connection_id: AtomicU64::new(1),
        })
    }

    /// Replace the global error handler.
    ///
    /// Receives server error frames as `GlobeError::Server` and runtime
    /// transport failures as `GlobeError::Transport`. Set before connecting.
    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(GlobeError) + Send + Sync + 'static,
    {
        self.dispatcher = Arc::new(Dispatcher::new(self.registry.clone(), Arc::new(handler)));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.lock_shared().state
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Registry keys of the current subscriptions, sorted
    pub fn active_topics(&self) -> Vec<String> {
        self.registry.keys()
    }

    /// Open the connection. Returns at once if it is already open.
    pub async fn connect(&self) -> Result<()> {
        self.connect_with_cleanup(|| {}).await
    }

    /// Open the connection, running `on_timeout` if the handshake deadline
    /// passes first. A handshake that completes after the deadline is dropped.
    ///
    /// A [`close`](Self::close) issued while the handshake is in flight wins:
    /// the new socket is discarded, the state stays `Closed` and
    /// `NotConnected` is returned.
    pub async fn connect_with_cleanup<F>(&self, on_timeout: F) -> Result<()>
    where
        F: FnOnce(),
    {
        let _gate = self.connect_gate.lock().await;
        if self.state() == ConnectionState::Open {
            debug!("ws already connected");
            return Ok(());
        }

        let request = self.handshake_request()?;
        self.set_state(ConnectionState::Connecting);
        info!(
            url = %self.config.ws_url(),
            authenticated = self.signer.is_some(),
            "ws connecting"
        );

        let timeout_ms = self.config.connection_timeout_ms;
        let handshake = tokio::time::timeout(self.config.connection_timeout(), connect_async(request));
        let stream = match handshake.await {
            Err(_) => {
                self.fail_handshake();
                warn!(timeout_ms, "ws handshake timed out");
                on_timeout();
                return Err(GlobeError::Timeout { timeout_ms });
            }
            Ok(Err(err)) => {
                self.fail_handshake();
                warn!(error = %err, "ws handshake failed");
                return Err(err.into());
            }
            Ok(Ok((stream, _response))) => stream,
        };

        let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        {
            let mut shared = self.lock_shared();
            if shared.state != ConnectionState::Connecting {
                info!(state = ?shared.state, "ws closed during handshake");
                return Err(GlobeError::NotConnected);
            }
            shared.connection = Some(Connection {
                id,
                outbound: outbound_tx,
            });
            shared.state = ConnectionState::Open;
        }

        tokio::spawn(run_connection(
            stream,
            outbound_rx,
            id,
            self.shared.clone(),
            self.dispatcher.clone(),
        ));
        info!(connection_id = id, "ws connected");
        Ok(())
    }

    /// Serialize and queue one frame
    pub fn send<T>(&self, message: &T) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        let text = serde_json::to_string(message)?;
        self.outbound()?
            .send(WsMessage::Text(text.into()))
            .map_err(|_| GlobeError::NotConnected)
    }

    /// Subscribe to a topic, replacing any handler already registered under
    /// the same key.
    ///
    /// The handler is recorded before the frame goes out so the first pushed
    /// update cannot be missed.
    pub fn subscribe<F>(&self, topic: Topic, on_message: F) -> Result<()>
    where
        F: Fn(ChannelMessage) + Send + Sync + 'static,
    {
        if topic.channel.requires_auth() {
            self.require_credentials(topic.channel.as_str())?;
        }
        let outbound = self.outbound()?;
        let key = topic.key();
        let frame = serde_json::to_string(&Command::Subscribe(topic.clone()))?;

        if self.registry.insert(key.clone(), Arc::new(on_message)) {
            debug!(key = %key, "ws subscription handler replaced");
        }
        if outbound.send(WsMessage::Text(frame.into())).is_err() {
            self.registry.remove(&key);
            return Err(GlobeError::NotConnected);
        }

        info!(
            action = "subscribe",
            channel = %topic.channel,
            instrument = ?topic.instrument,
            "ws subscription sent"
        );
        Ok(())
    }

    /// Drop the handler for a topic, then tell the server.
    ///
    /// The handler is removed even when the connection is down. Only
    /// `my-orders` is keyed per instrument; every other channel shares one
    /// key, so unsubscribing `depth("ETHUSD")` also drops the handler that
    /// served `depth("XBTUSD")`.
    pub fn unsubscribe(&self, topic: &Topic) -> Result<()> {
        self.registry.remove(&topic.key());
        self.send(&Command::Unsubscribe(topic.clone()))?;
        info!(
            action = "unsubscribe",
            channel = %topic.channel,
            instrument = ?topic.instrument,
            "ws subscription sent"
        );
        Ok(())
    }

    /// Drop the connection without a close handshake.
    ///
    /// Frames queued before the call may still be written. Calling it while
    /// another task is connecting cancels that connect.
    pub fn close(&self) {
        let mut shared = self.lock_shared();
        if shared.state == ConnectionState::Idle {
            warn!("ws close called before connect");
            return;
        }
        if let Some(connection) = shared.connection.take() {
            info!(connection_id = connection.id, "ws closing");
        }
        shared.state = ConnectionState::Closed;
    }

    pub(crate) fn require_credentials(&self, operation: &'static str) -> Result<()> {
        match self.signer {
            Some(_) => Ok(()),
            None => Err(GlobeError::AuthRequired { operation }),
        }
    }

    fn outbound(&self) -> Result<mpsc::UnboundedSender<WsMessage>> {
        self.lock_shared()
            .connection
            .as_ref()
            .map(|connection| connection.outbound.clone())
            .ok_or(GlobeError::NotConnected)
    }

    fn handshake_request(&self) -> Result<Request> {
        let mut request = self.config.ws_url().into_client_request()?;
        if let Some(signer) = &self.signer {
            let headers = signer.auth_headers(&RequestDescriptor::get(WS_PATH));
            for (name, value) in headers.iter() {
                let header_name: HeaderName = name
                    .parse()
                    .map_err(|_| GlobeError::InvalidHeader(name.to_string()))?;
                let header_value = HeaderValue::from_str(value)
                    .map_err(|_| GlobeError::InvalidHeader(name.to_string()))?;
                request.headers_mut().insert(header_name, header_value);
            }
        }
        Ok(request)
    }

    fn set_state(&self, state: ConnectionState) {
        self.lock_shared().state = state;
    }

    /// Mark a failed handshake unless `close` already moved the state on
    fn fail_handshake(&self) {
        let mut shared = self.lock_shared();
        if shared.state == ConnectionState::Connecting {
            shared.state = ConnectionState::Errored;
        }
    }

    fn lock_shared(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for GlobeWebSocket {
    fn drop(&mut self) {
        self.lock_shared().connection.take();
    }
}

impl std::fmt::Debug for GlobeWebSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobeWebSocket")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

fn default_error_handler() -> ErrorHandler {
    Arc::new(|err: GlobeError| warn!(error = %err, "ws error"))
}

/// Owns the socket for one connection. Ends when the server closes, the
/// transport fails, or every outbound sender is dropped.
async fn run_connection(
    stream: WsStream,
    mut outbound_rx: mpsc::UnboundedReceiver<WsMessage>,
    id: u64,
    shared: Arc<Mutex<Shared>>,
    dispatcher: Arc<Dispatcher>,
) {
    let (mut write, mut read) = stream.split();

    let end_state = loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                match outbound {
                    Some(message) => {
                        if let Err(err) = write.send(message).await {
                            dispatcher.report(err.into());
                            break ConnectionState::Errored;
                        }
                    }
                    None => break ConnectionState::Closed,
                }
            }
            incoming = read.next() => {
                match incoming {
                    Some(Ok(WsMessage::Text(text))) => dispatch(&dispatcher, id, text.as_str()),
                    Some(Ok(WsMessage::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => dispatch(&dispatcher, id, text),
                        Err(_) => debug!(bytes = bytes.len(), "ws binary frame is not utf-8"),
                    },
                    Some(Ok(WsMessage::Close(frame))) => {
                        info!(connection_id = id, frame = ?frame, "ws closed by server");
                        let _ = write.send(WsMessage::Close(None)).await;
                        break ConnectionState::Closed;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        dispatcher.report(err.into());
                        break ConnectionState::Errored;
                    }
                    None => break ConnectionState::Closed,
                }
            }
        }
    };

    let mut shared = shared.lock().unwrap_or_else(PoisonError::into_inner);
    if shared
        .connection
        .as_ref()
        .is_some_and(|connection| connection.id == id)
    {
        shared.connection = None;
        shared.state = end_state;
    }
    debug!(connection_id = id, state = ?end_state, "ws connection task ended");
}

fn dispatch(dispatcher: &Dispatcher, connection_id: u64, text: &str) {
    if let DispatchOutcome::Delivered { key } = dispatcher.dispatch_text(text) {
        trace!(connection_id, key = %key, "ws message delivered");
    }
}
