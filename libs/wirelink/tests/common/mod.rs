//! Common test utilities for wirelink integration tests
//!
//! - [`MockConnector`]: in-memory scripted transport (handshake failures,
//!   injected inbound frames, failing writes, recorded outbound frames)
//! - [`MockChatServer`]: a real tungstenite server speaking the chat protocol

#![allow(dead_code)]

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use wirelink::{
    Connector, Result, SessionEvent, TransportPair, TransportSink, TransportStream, WireError,
    WsMessage,
};

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Shared state behind a [`MockConnector`]
#[derive(Default)]
pub struct MockState {
    /// `false` entries fail the corresponding handshake; empty script succeeds
    script: Mutex<VecDeque<bool>>,
    fail_all: AtomicBool,
    connects: AtomicUsize,
    connect_times: Mutex<Vec<Instant>>,
    sent: Mutex<Vec<WsMessage>>,
    fail_writes: AtomicBool,
    write_delay: Mutex<Option<Duration>>,
    close_delay: Mutex<Option<Duration>>,
    handshake_delay: Mutex<Option<Duration>>,
    inbound: Mutex<Option<mpsc::UnboundedSender<Result<WsMessage>>>>,
}

impl MockState {
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    pub fn connect_times(&self) -> Vec<Instant> {
        self.connect_times.lock().clone()
    }

    /// Queue handshake outcomes, consumed one per connect
    pub fn script(&self, outcomes: &[bool]) {
        self.script.lock().extend(outcomes.iter().copied());
    }

    pub fn fail_all_handshakes(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn delay_writes(&self, delay: Duration) {
        *self.write_delay.lock() = Some(delay);
    }

    /// Make `TransportSink::close` hang for `delay`
    pub fn delay_closes(&self, delay: Duration) {
        *self.close_delay.lock() = Some(delay);
    }

    pub fn delay_handshakes(&self, delay: Duration) {
        *self.handshake_delay.lock() = Some(delay);
    }

    pub fn sent(&self) -> Vec<WsMessage> {
        self.sent.lock().clone()
    }

    /// Text frames written so far
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|m| m.as_text().map(str::to_string))
            .collect()
    }

    pub fn clear_sent(&self) {
        self.sent.lock().clear();
    }

    /// Deliver a frame on the current transport
    pub fn inject(&self, message: WsMessage) -> bool {
        match self.inbound.lock().as_ref() {
            Some(tx) => tx.send(Ok(message)).is_ok(),
            None => false,
        }
    }

    pub fn inject_text(&self, text: &str) -> bool {
        self.inject(WsMessage::Text(text.to_string()))
    }

    /// Fail the current transport's read side
    pub fn inject_error(&self, reason: &str) -> bool {
        match self.inbound.lock().as_ref() {
            Some(tx) => tx.send(Err(WireError::Transport(reason.to_string()))).is_ok(),
            None => false,
        }
    }

    /// End the current transport's stream
    pub fn drop_transport(&self) {
        self.inbound.lock().take();
    }
}

/// Scripted in-memory connector
#[derive(Clone, Default)]
pub struct MockConnector {
    pub state: Arc<MockState>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn connect(&self, url: &str, _handshake_timeout: Duration) -> Result<TransportPair> {
        let state = &self.state;
        state.connects.fetch_add(1, Ordering::SeqCst);
        state.connect_times.lock().push(Instant::now());

        let delay = *state.handshake_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = state.script.lock().pop_front();
        let ok = scripted.unwrap_or(true) && !state.fail_all.load(Ordering::SeqCst);
        if !ok {
            return Err(WireError::Handshake(format!("scripted failure for {}", url)));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        *state.inbound.lock() = Some(tx);

        Ok(TransportPair::new(
            Box::new(MockSink {
                state: Arc::clone(state),
            }),
            Box::new(MockStream { rx }),
        ))
    }
}

struct MockSink {
    state: Arc<MockState>,
}

#[async_trait]
impl TransportSink for MockSink {
    async fn send(&mut self, message: WsMessage) -> Result<()> {
        let delay = *self.state.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.state.fail_writes.load(Ordering::SeqCst) {
            return Err(WireError::Transport("broken pipe".into()));
        }
        self.state.sent.lock().push(message);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        let delay = *self.state.close_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

struct MockStream {
    rx: mpsc::UnboundedReceiver<Result<WsMessage>>,
}

#[async_trait]
impl TransportStream for MockStream {
    async fn next(&mut self) -> Option<Result<WsMessage>> {
        self.rx.recv().await
    }
}

/// Drain every event currently queued on the session
pub fn drain_events(session: &wirelink::ConnectionSession) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Some(event) = session.try_recv_event() {
        events.push(event);
    }
    events
}

/// Poll `condition` every 10ms until it holds or `limit` elapses
pub async fn wait_until<F: Fn() -> bool>(limit: Duration, condition: F) -> bool {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

struct ServerShared {
    next_id: AtomicUsize,
    clients: Mutex<Vec<mpsc::UnboundedSender<Message>>>,
    received: Mutex<Vec<String>>,
    kick: Notify,
    shutdown: Notify,
}

/// A mock chat endpoint over real WebSockets
///
/// - `{"action":"getId"}` → `{"connectionId":"conn-N","name":"Hermit"}`
/// - `{"action":"sendMessage",...}` → relayed to every client as a chat frame
///   from the sender
/// - ping → pong
pub struct MockChatServer {
    pub addr: SocketAddr,
    shared: Arc<ServerShared>,
}

impl MockChatServer {
    /// Create and start a new mock chat server
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shared = Arc::new(ServerShared {
            next_id: AtomicUsize::new(1),
            clients: Mutex::new(Vec::new()),
            received: Mutex::new(Vec::new()),
            kick: Notify::new(),
            shutdown: Notify::new(),
        });

        let accept_shared = Arc::clone(&shared);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => match result {
                        Ok((stream, _)) => {
                            let shared = Arc::clone(&accept_shared);
                            tokio::spawn(async move {
                                Self::handle_connection(stream, shared).await;
                            });
                        }
                        Err(e) => {
                            eprintln!("Accept error: {}", e);
                            break;
                        }
                    },
                    _ = accept_shared.shutdown.notified() => break,
                }
            }
        });

        Self { addr, shared }
    }

    async fn handle_connection(stream: tokio::net::TcpStream, shared: Arc<ServerShared>) {
        let ws_stream = match tokio_tungstenite::accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let conn_id = format!("conn-{}", shared.next_id.fetch_add(1, Ordering::SeqCst));
        let (mut write, mut read) = ws_stream.split();
        let (tx, mut outbox) = mpsc::unbounded_channel();
        shared.clients.lock().push(tx.clone());

        loop {
            tokio::select! {
                msg = read.next() => match msg {
                    Some(Ok(Message::Text(text))) => {
                        shared.received.lock().push(text.clone());
                        let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
                            continue;
                        };
                        match value["action"].as_str() {
                            Some("getId") => {
                                let reply = serde_json::json!({
                                    "connectionId": conn_id,
                                    "name": "Hermit",
                                });
                                let _ = tx.send(Message::Text(reply.to_string()));
                            }
                            Some("sendMessage") => {
                                let frame = serde_json::json!({
                                    "message": value["data"]["message"],
                                    "sender": conn_id,
                                    "senderName": "Hermit",
                                });
                                Self::broadcast(&shared, Message::Text(frame.to_string()));
                            }
                            _ => {}
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if write.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                },
                Some(out) = outbox.recv() => {
                    if write.send(out).await.is_err() {
                        break;
                    }
                }
                _ = shared.kick.notified() => break,
                _ = shared.shutdown.notified() => break,
            }
        }
    }

    fn broadcast(shared: &ServerShared, message: Message) {
        shared
            .clients
            .lock()
            .retain(|client| client.send(message.clone()).is_ok());
    }

    /// Deliver a chat frame from another participant to every client
    pub fn say(&self, sender_id: &str, sender_name: &str, text: &str) {
        let frame = serde_json::json!({
            "message": text,
            "sender": sender_id,
            "senderName": sender_name,
        });
        Self::broadcast(&self.shared, Message::Text(frame.to_string()));
    }

    /// Text frames received from clients
    pub fn received(&self) -> Vec<String> {
        self.shared.received.lock().clone()
    }

    /// Drop every open connection without a close handshake
    pub fn kick_all(&self) {
        self.shared.kick.notify_waiters();
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shared.shutdown.notify_waiters();
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
