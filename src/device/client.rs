// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! WebSocket connection to the television.

use std::collections::HashMap;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::message::{Inbound, MessageType, Outbound, REGISTER_ID};
use super::{DeviceControl, DeviceEvent, KeyStore};
use crate::command::{DeviceRequest, PointerEvent, uri};
use crate::error::{DeviceError, Error, ProtocolError};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Default delay between reconnection attempts.
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(1000);

/// Default capacity of the event channel.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Upper bound on opening the pointer input socket.
const POINTER_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Calls queued by [`WebOsClient`] for the connection task.
#[derive(Debug)]
enum Instruction {
    Request(DeviceRequest),
    Subscribe(String),
    Pointer(PointerEvent),
}

/// Handle to the television connection.
///
/// Cheap to clone; all clones feed the same connection task. The task stops
/// once every handle is dropped.
#[derive(Debug, Clone)]
pub struct WebOsClient {
    tx: mpsc::UnboundedSender<Instruction>,
}

impl WebOsClient {
    /// Creates a new builder.
    #[must_use]
    pub fn builder() -> WebOsClientBuilder {
        WebOsClientBuilder::default()
    }

    fn enqueue(&self, instruction: Instruction) -> Result<(), ProtocolError> {
        self.tx
            .send(instruction)
            .map_err(|_| ProtocolError::ChannelClosed("television client stopped".to_string()))
    }
}

impl DeviceControl for WebOsClient {
    fn request(&self, request: DeviceRequest) -> Result<(), ProtocolError> {
        self.enqueue(Instruction::Request(request))
    }

    fn subscribe(&self, uri: &str) -> Result<(), ProtocolError> {
        self.enqueue(Instruction::Subscribe(uri.to_string()))
    }

    fn send_pointer(&self, event: PointerEvent) -> Result<(), ProtocolError> {
        self.enqueue(Instruction::Pointer(event))
    }
}

/// Builder for [`WebOsClient`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use lgtv_bridge::device::{KeyStore, WebOsClient};
///
/// # async fn example() -> lgtv_bridge::Result<()> {
/// let (client, events) = WebOsClient::builder()
///     .url("ws://192.168.1.20:3000")
///     .key_store(KeyStore::new("/var/lib/lgkey/keyfile-192.168.1.20"))
///     .reconnect_delay(Duration::from_secs(2))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct WebOsClientBuilder {
    url: Option<String>,
    key_store: Option<KeyStore>,
    reconnect_delay: Duration,
    event_capacity: usize,
}

impl Default for WebOsClientBuilder {
    fn default() -> Self {
        Self {
            url: None,
            key_store: None,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl WebOsClientBuilder {
    /// Sets the SSAP endpoint, e.g. `ws://192.168.1.20:3000`.
    #[must_use]
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets where the pairing key is kept. Without one, every connection
    /// shows the pairing prompt.
    #[must_use]
    pub fn key_store(mut self, key_store: KeyStore) -> Self {
        self.key_store = Some(key_store);
        self
    }

    /// Sets the delay between reconnection attempts (default: 1 second).
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Spawns the connection task.
    ///
    /// Returns the client handle and the receiver for its events. Connection
    /// failures are reported as events, never as an error here.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidAddress`] if no `ws://` URL is set.
    pub fn build(self) -> Result<(WebOsClient, mpsc::Receiver<DeviceEvent>), ProtocolError> {
        let url = self
            .url
            .ok_or_else(|| ProtocolError::InvalidAddress("television URL is required".to_string()))?;
        if !url.starts_with("ws://") && !url.starts_with("wss://") {
            return Err(ProtocolError::InvalidAddress(format!(
                "expected ws:// or wss:// URL: {url}"
            )));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::channel(self.event_capacity);

        let connection = Connection {
            url,
            key_store: self.key_store,
            reconnect_delay: self.reconnect_delay,
            events: event_tx,
        };
        tokio::spawn(connection.run(rx));

        Ok((WebOsClient { tx }, event_rx))
    }
}

/// How a session ended.
enum SessionEnd {
    /// Every client handle was dropped.
    Shutdown,
    /// The connection closed or failed.
    Lost {
        registered: bool,
        error: Option<Error>,
    },
}

/// What an outstanding message id is waiting for.
#[derive(Debug)]
enum Pending {
    Request(String),
    Subscription(String),
    PointerSocket,
}

/// State of the pointer input socket.
///
/// Events queue up in `Requested` until the socket path has been answered
/// and the socket opened.
enum PointerSocket {
    Closed,
    Requested(Vec<PointerEvent>),
    Open(WsStream),
}

/// Outcome of a background pointer socket connect.
type PointerOpened = Option<WsStream>;

struct Connection {
    url: String,
    key_store: Option<KeyStore>,
    reconnect_delay: Duration,
    events: mpsc::Sender<DeviceEvent>,
}

impl Connection {
    async fn run(self, mut instructions: mpsc::UnboundedReceiver<Instruction>) {
        loop {
            self.emit(DeviceEvent::Connecting {
                url: self.url.clone(),
            })
            .await;

            let end = match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    tracing::debug!(url = %self.url, "WebSocket open, registering");
                    self.session(stream, &mut instructions).await
                }
                Err(e) => SessionEnd::Lost {
                    registered: false,
                    error: Some(ProtocolError::from(e).into()),
                },
            };

            match end {
                SessionEnd::Shutdown => {
                    tracing::debug!(url = %self.url, "Television client stopped");
                    return;
                }
                SessionEnd::Lost { registered, error } => {
                    if let Some(error) = error {
                        self.emit(DeviceEvent::Error(error.to_string())).await;
                    }
                    if registered {
                        self.emit(DeviceEvent::Disconnected).await;
                    }
                }
            }

            if self.events.is_closed() || !self.wait_reconnect(&mut instructions).await {
                return;
            }
        }
    }

    /// Sleeps for the reconnect delay, dropping calls made meanwhile.
    ///
    /// Returns `false` if every client handle was dropped.
    async fn wait_reconnect(&self, instructions: &mut mpsc::UnboundedReceiver<Instruction>) -> bool {
        let delay = tokio::time::sleep(self.reconnect_delay);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                () = &mut delay => return true,
                instruction = instructions.recv() => match instruction {
                    Some(instruction) => {
                        tracing::debug!(?instruction, "Television not connected, dropping call");
                    }
                    None => return false,
                },
            }
        }
    }

    async fn emit(&self, event: DeviceEvent) {
        // The receiver going away is noticed by the reconnect loop.
        let _ = self.events.send(event).await;
    }

    async fn session(
        &self,
        stream: WsStream,
        instructions: &mut mpsc::UnboundedReceiver<Instruction>,
    ) -> SessionEnd {
        let (mut sink, mut source) = stream.split();
        let (opened_tx, mut opened_rx) = mpsc::channel(1);
        let mut session = Session::new(opened_tx);

        let client_key = match &self.key_store {
            Some(store) => store.load().await.unwrap_or_else(|e| {
                tracing::warn!(path = %store.path().display(), error = %e, "Cannot read pairing key");
                None
            }),
            None => None,
        };

        if let Err(error) = send(&mut sink, &Outbound::register(client_key.as_deref())).await {
            return SessionEnd::Lost {
                registered: false,
                error: Some(error),
            };
        }

        loop {
            tokio::select! {
                frame = source.next() => {
                    let error = match frame {
                        Some(Ok(Message::Text(text))) => {
                            let key = client_key.as_deref();
                            match self.handle_frame(&mut session, &text, key).await {
                                Ok(()) => continue,
                                Err(e) => Some(e),
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => None,
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => Some(ProtocolError::from(e).into()),
                    };
                    return SessionEnd::Lost { registered: session.registered, error };
                }
                instruction = instructions.recv() => {
                    let Some(instruction) = instruction else {
                        let _ = sink.close().await;
                        return SessionEnd::Shutdown;
                    };
                    if !session.registered {
                        tracing::debug!(?instruction, "Television not paired yet, dropping call");
                        continue;
                    }
                    if let Err(error) = session.dispatch(&mut sink, instruction).await {
                        return SessionEnd::Lost { registered: true, error: Some(error) };
                    }
                }
                Some(opened) = opened_rx.recv() => session.pointer_opened(opened).await,
            }
        }
    }

    async fn handle_frame(
        &self,
        session: &mut Session,
        text: &str,
        stored_key: Option<&str>,
    ) -> Result<(), Error> {
        let msg = match Inbound::parse(text) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!(error = %e, frame = %text, "Ignoring malformed frame");
                return Ok(());
            }
        };

        if msg.id.as_deref() == Some(REGISTER_ID) {
            return self.handle_registration(session, &msg, stored_key).await;
        }

        let Some(id) = msg.id.as_deref() else {
            tracing::trace!(frame = %text, "Ignoring frame without id");
            return Ok(());
        };

        match session.pending.get(id) {
            Some(Pending::Subscription(uri)) => {
                let uri = uri.clone();
                if let Some(error) = msg.failure() {
                    session.pending.remove(id);
                    self.emit(DeviceEvent::SubscriptionFailed { uri, error }).await;
                } else {
                    self.emit(DeviceEvent::Update {
                        uri,
                        payload: msg.payload,
                    })
                    .await;
                }
            }
            Some(Pending::Request(_)) => {
                if let Some(Pending::Request(uri)) = session.pending.remove(id) {
                    match msg.failure() {
                        Some(error) => tracing::warn!(uri = %uri, error = %error, "Request failed"),
                        None => tracing::debug!(uri = %uri, payload = %msg.payload, "Request succeeded"),
                    }
                }
            }
            Some(Pending::PointerSocket) => {
                session.pending.remove(id);
                let socket_path = msg.payload.get("socketPath").and_then(|v| v.as_str());
                match (msg.failure(), socket_path) {
                    (None, Some(path)) => session.open_pointer(path),
                    (failure, _) => {
                        tracing::warn!(error = ?failure, "Pointer input socket unavailable");
                        session.pointer = PointerSocket::Closed;
                    }
                }
            }
            None => tracing::trace!(id = %id, "Response for unknown id"),
        }

        Ok(())
    }

    async fn handle_registration(
        &self,
        session: &mut Session,
        msg: &Inbound,
        stored_key: Option<&str>,
    ) -> Result<(), Error> {
        match msg.kind {
            MessageType::Registered => {
                if let (Some(key), Some(store)) = (msg.client_key(), &self.key_store)
                    && Some(key) != stored_key
                    && let Err(e) = store.save(key).await
                {
                    tracing::error!(path = %store.path().display(), error = %e, "Cannot save pairing key");
                }
                session.registered = true;
                self.emit(DeviceEvent::Connected).await;
                Ok(())
            }
            MessageType::Error => {
                let reason = msg.failure().unwrap_or_default();
                Err(DeviceError::Rejected(format!("registration: {reason}")).into())
            }
            _ => {
                if msg.is_pairing_prompt() {
                    self.emit(DeviceEvent::Prompt).await;
                }
                Ok(())
            }
        }
    }
}

/// Per-connection state.
struct Session {
    registered: bool,
    next_id: u64,
    pending: HashMap<String, Pending>,
    pointer: PointerSocket,
    pointer_opened: mpsc::Sender<PointerOpened>,
}

impl Session {
    fn new(pointer_opened: mpsc::Sender<PointerOpened>) -> Self {
        Self {
            registered: false,
            next_id: 1,
            pending: HashMap::new(),
            pointer: PointerSocket::Closed,
            pointer_opened,
        }
    }

    fn next_id(&mut self) -> String {
        let id = self.next_id;
        self.next_id += 1;
        id.to_string()
    }

    async fn dispatch(&mut self, sink: &mut WsSink, instruction: Instruction) -> Result<(), Error> {
        match instruction {
            Instruction::Request(request) => {
                let id = self.next_id();
                let (uri, payload) = request.into_parts();
                let msg = Outbound::request(id.clone(), uri.clone(), payload);
                self.pending.insert(id, Pending::Request(uri));
                send(sink, &msg).await
            }
            Instruction::Subscribe(uri) => {
                let id = self.next_id();
                let msg = Outbound::subscribe(id.clone(), uri.clone());
                self.pending.insert(id, Pending::Subscription(uri));
                send(sink, &msg).await
            }
            Instruction::Pointer(event) => self.pointer_event(sink, event).await,
        }
    }

    async fn pointer_event(&mut self, sink: &mut WsSink, event: PointerEvent) -> Result<(), Error> {
        if let PointerSocket::Open(socket) = &mut self.pointer {
            match socket.send(Message::Text(event.encode())).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(error = %e, "Pointer input socket lost, reopening");
                    self.pointer = PointerSocket::Closed;
                }
            }
        }

        if let PointerSocket::Requested(queue) = &mut self.pointer {
            queue.push(event);
            return Ok(());
        }

        let id = self.next_id();
        self.pending.insert(id.clone(), Pending::PointerSocket);
        self.pointer = PointerSocket::Requested(vec![event]);
        send(sink, &Outbound::request(id, uri::POINTER_INPUT_SOCKET, None)).await
    }

    /// Connects to the pointer socket in the background so the main socket
    /// keeps being read meanwhile.
    fn open_pointer(&self, path: &str) {
        let path = path.to_string();
        let report = self.pointer_opened.clone();
        tokio::spawn(async move {
            let connect = connect_async(path.as_str());
            let socket = match tokio::time::timeout(POINTER_CONNECT_TIMEOUT, connect).await {
                Ok(Ok((socket, _))) => Some(socket),
                Ok(Err(e)) => {
                    tracing::warn!(path = %path, error = %e, "Cannot open pointer input socket");
                    None
                }
                Err(_) => {
                    tracing::warn!(path = %path, "Timed out opening pointer input socket");
                    None
                }
            };
            // The session may have ended while connecting.
            let _ = report.send(socket).await;
        });
    }

    async fn pointer_opened(&mut self, opened: PointerOpened) {
        let queued = match std::mem::replace(&mut self.pointer, PointerSocket::Closed) {
            PointerSocket::Requested(queue) => queue,
            other => {
                self.pointer = other;
                tracing::debug!("Discarding stale pointer input socket");
                return;
            }
        };
        let Some(mut socket) = opened else {
            tracing::debug!(dropped = queued.len(), "Pointer events dropped");
            return;
        };

        tracing::debug!(queued = queued.len(), "Pointer input socket open");
        for event in queued {
            if let Err(e) = socket.send(Message::Text(event.encode())).await {
                tracing::warn!(error = %e, "Pointer input socket lost");
                return;
            }
        }
        self.pointer = PointerSocket::Open(socket);
    }
}

async fn send(sink: &mut WsSink, msg: &Outbound) -> Result<(), Error> {
    let text = msg.to_json()?;
    tracing::trace!(frame = %text, "Sending frame");
    sink.send(Message::Text(text))
        .await
        .map_err(|e| ProtocolError::from(e).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let builder = WebOsClientBuilder::default();
        assert!(builder.url.is_none());
        assert!(builder.key_store.is_none());
        assert_eq!(builder.reconnect_delay, Duration::from_millis(1000));
    }

    #[test]
    fn builder_chain() {
        let builder = WebOsClient::builder()
            .url("ws://10.0.0.2:3000")
            .key_store(KeyStore::new("key"))
            .reconnect_delay(Duration::from_secs(5));
        assert_eq!(builder.url.as_deref(), Some("ws://10.0.0.2:3000"));
        assert_eq!(builder.key_store, Some(KeyStore::new("key")));
        assert_eq!(builder.reconnect_delay, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn build_requires_url() {
        let err = WebOsClient::builder().build().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn build_rejects_non_ws_url() {
        let err = WebOsClient::builder().url("http://10.0.0.2:3000").build().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidAddress(_)));
    }

    #[test]
    fn session_ids_increase() {
        let (opened, _) = mpsc::channel(1);
        let mut session = Session::new(opened);
        assert_eq!(session.next_id(), "1");
        assert_eq!(session.next_id(), "2");
    }
}
