use crate::core::config::SessionConfig;
use crate::core::connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
use crate::core::events::{Metrics, SessionEvent};
use crate::core::liveness::Liveness;
use crate::core::shutdown::ShutdownSignal;
use crate::core::{heartbeat, reader, supervisor};
use crate::dispatch::queue::{inbound_queue, InboundQueue, InboundReceiver};
use crate::ratelimit::{RateLimitMiddleware, RateLimiter};
use crate::traits::*;
use async_trait::async_trait;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// Long-lived duplex session with automatic reconnection
///
/// Cloning is cheap; every clone drives the same underlying session.
///
/// - All writes go through a single write lock, so frames never interleave
/// - Every outbound message passes the rate limiter (if one is configured)
///   before the lock is taken
/// - A transport failure moves Connected → Reconnecting exactly once and
///   starts a single reconnect supervisor
#[derive(Clone)]
pub struct ConnectionSession {
    inner: Arc<SessionInner>,
    event_rx: Receiver<SessionEvent>,
}

pub(crate) struct SessionInner {
    pub(crate) config: SessionConfig,
    connector: Arc<dyn Connector>,
    pub(crate) strategy: Arc<dyn ReconnectionStrategy>,
    limiter: Option<RateLimitMiddleware>,
    pub(crate) state: AtomicConnectionState,
    pub(crate) metrics: AtomicMetrics,
    pub(crate) liveness: Liveness,
    pub(crate) shutdown: ShutdownSignal,
    /// Write half of the current transport; the lock is the session's write lock
    writer: tokio::sync::Mutex<Option<Box<dyn TransportSink>>>,
    /// Stops the read loop of the current transport
    read_cancel: parking_lot::Mutex<Option<oneshot::Sender<()>>>,
    /// Bumped on every installed transport so stale read loops can tell
    generation: AtomicU64,
    /// Set while a reconnect supervisor is running
    pub(crate) reconnecting: AtomicBool,
    heartbeat_started: AtomicBool,
    last_write: parking_lot::Mutex<Option<Instant>>,
    identity: parking_lot::RwLock<Option<Identity>>,
    inbound: InboundQueue,
    event_tx: Sender<SessionEvent>,
}

impl ConnectionSession {
    pub(crate) fn new(
        config: SessionConfig,
        connector: Arc<dyn Connector>,
        strategy: Arc<dyn ReconnectionStrategy>,
        limiter: Option<Arc<RateLimiter>>,
    ) -> Result<(Self, InboundReceiver)> {
        config.validate()?;

        let (inbound, receiver) = inbound_queue(config.inbound_buffer);
        let (event_tx, event_rx) = unbounded();

        let inner = SessionInner {
            liveness: Liveness::new(config.read_timeout),
            config,
            connector,
            strategy,
            limiter: limiter.map(RateLimitMiddleware::new),
            state: AtomicConnectionState::new(ConnectionState::Disconnected),
            metrics: AtomicMetrics::new(),
            shutdown: ShutdownSignal::new(),
            writer: tokio::sync::Mutex::new(None),
            read_cancel: parking_lot::Mutex::new(None),
            generation: AtomicU64::new(0),
            reconnecting: AtomicBool::new(false),
            heartbeat_started: AtomicBool::new(false),
            last_write: parking_lot::Mutex::new(None),
            identity: parking_lot::RwLock::new(None),
            inbound,
            event_tx,
        };

        Ok((
            Self {
                inner: Arc::new(inner),
                event_rx,
            },
            receiver,
        ))
    }

    /// Start building a session
    pub fn builder() -> crate::core::builder::SessionBuilder<crate::core::builder::states::NoUrl> {
        crate::core::builder::SessionBuilder::new()
    }

    /// Perform the handshake and start the read loop
    ///
    /// Valid only from Disconnected. On success an identity request is sent
    /// right away.
    pub async fn connect(&self) -> Result<()> {
        self.inner.connect().await
    }

    /// Send one message through the rate limiter and the write lock
    pub async fn send(&self, message: OutboundMessage) -> Result<()> {
        self.inner.send(message).await
    }

    /// Ask the endpoint for our identity (`{"action":"getId"}`)
    pub async fn request_identity(&self) -> Result<()> {
        self.inner.request_identity().await
    }

    /// Spawn the heartbeat task. Returns `None` if it is already running.
    pub fn start_heartbeat(&self) -> Option<JoinHandle<()>> {
        if self.inner.heartbeat_started.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some(heartbeat::spawn_heartbeat(Arc::clone(&self.inner)))
    }

    /// Close the session for good. Idempotent.
    pub async fn close(&self) -> Result<()> {
        self.inner.close().await
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.get()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.state.is_connected()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    /// Time of the last successful write
    pub fn last_write(&self) -> Option<Instant> {
        *self.inner.last_write.lock()
    }

    pub fn metrics(&self) -> Metrics {
        Metrics {
            messages_sent: self.inner.metrics.messages_sent(),
            messages_received: self.inner.metrics.messages_received(),
            frames_dropped: self.inner.metrics.frames_dropped(),
            reconnect_count: self.inner.metrics.reconnect_count(),
            connection_state: self.inner.state.get(),
            time_since_last_pong: self.inner.liveness.time_since_last_pong(),
        }
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Receive an event with timeout (blocking)
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Shared handle to the event channel
    pub fn events(&self) -> Receiver<SessionEvent> {
        self.event_rx.clone()
    }
}

#[async_trait]
impl SessionHandle for ConnectionSession {
    async fn send(&self, message: OutboundMessage) -> Result<()> {
        self.inner.send(message).await
    }

    fn identity(&self) -> Option<Identity> {
        self.inner.identity.read().clone()
    }

    fn assign_identity(&self, identity: Identity) -> bool {
        let mut slot = self.inner.identity.write();
        if slot.is_some() {
            return false;
        }
        *slot = Some(identity);
        true
    }

    fn observe(&self, event: SessionEvent) {
        self.inner.emit(event);
    }
}

impl SessionInner {
    pub(crate) fn emit(&self, event: SessionEvent) {
        let _ = self.event_tx.send(event);
    }

    pub(crate) fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub(crate) fn inbound(&self) -> &InboundQueue {
        &self.inbound
    }

    async fn connect(self: &Arc<Self>) -> Result<()> {
        if !self
            .state
            .transition(ConnectionState::Disconnected, ConnectionState::Connecting)
        {
            return match self.state.get() {
                ConnectionState::Closed => Err(WireError::NotConnected(ConnectionState::Closed)),
                other => Err(WireError::InvalidState(format!(
                    "connect() requires Disconnected, session is {:?}",
                    other
                ))),
            };
        }

        info!("Connecting to {}", self.config.url);

        let pair = match self.establish().await {
            Ok(pair) => pair,
            Err(e) => {
                error!("Failed to connect: {}", e);
                if self
                    .state
                    .transition(ConnectionState::Connecting, ConnectionState::Disconnected)
                {
                    self.emit(SessionEvent::Disconnected);
                }
                return Err(e);
            }
        };

        self.install(pair, ConnectionState::Connecting).await?;
        info!("Connected to {}", self.config.url);
        self.emit(SessionEvent::Connected);

        if let Err(e) = self.request_identity().await {
            warn!("Initial identity request failed: {}", e);
        }
        Ok(())
    }

    /// Handshake with the endpoint, bounded by the handshake timeout
    pub(crate) async fn establish(&self) -> Result<TransportPair> {
        let timeout = self.config.handshake_timeout;
        match tokio::time::timeout(timeout, self.connector.connect(&self.config.url, timeout)).await
        {
            Ok(Ok(pair)) => Ok(pair),
            Ok(Err(WireError::Handshake(msg))) => Err(WireError::Handshake(msg)),
            Ok(Err(e)) => Err(WireError::Handshake(e.to_string())),
            Err(_) => Err(WireError::Handshake(format!(
                "handshake timed out after {:?}",
                timeout
            ))),
        }
    }

    /// Make `pair` the current transport and mark the session Connected
    pub(crate) async fn install(
        self: &Arc<Self>,
        pair: TransportPair,
        from: ConnectionState,
    ) -> Result<()> {
        let TransportPair { sink, stream } = pair;
        let (cancel_tx, cancel_rx) = oneshot::channel();

        let generation = {
            let mut writer = self.writer.lock().await;
            if let Some(mut stale) = writer.take() {
                if tokio::time::timeout(self.config.write_timeout, stale.close())
                    .await
                    .is_err()
                {
                    debug!("Timed out closing stale transport");
                }
            }
            *writer = Some(sink);
            if let Some(previous) = self.read_cancel.lock().replace(cancel_tx) {
                let _ = previous.send(());
            }
            self.generation.fetch_add(1, Ordering::AcqRel) + 1
        };
        self.liveness.reset();

        if !self.state.transition(from, ConnectionState::Connected) {
            // close() won the race
            self.retire_transport().await;
            return Err(WireError::InvalidState(format!(
                "session became {:?} during handshake",
                self.state.get()
            )));
        }

        tokio::spawn(reader::run(Arc::clone(self), stream, generation, cancel_rx));
        Ok(())
    }

    /// Close and forget the current transport, stopping its read loop
    pub(crate) async fn retire_transport(&self) {
        if let Some(cancel) = self.read_cancel.lock().take() {
            let _ = cancel.send(());
        }
        let stale = self.writer.lock().await.take();
        if let Some(mut sink) = stale {
            match tokio::time::timeout(self.config.write_timeout, sink.close()).await {
                Ok(Ok(())) => debug!("Closed stale transport"),
                Ok(Err(e)) => debug!("Error closing stale transport: {}", e),
                Err(_) => debug!("Timed out closing stale transport"),
            }
        }
    }

    pub(crate) async fn send(self: &Arc<Self>, message: OutboundMessage) -> Result<()> {
        let payload = message.encode()?;

        let state = self.state.get();
        if state != ConnectionState::Connected {
            return Err(WireError::NotConnected(state));
        }

        let deadline = self.config.write_timeout;
        match &self.limiter {
            Some(limiter) => {
                limiter
                    .handle(message.route(), || {
                        self.write_frame(WsMessage::Text(payload.clone()), deadline)
                    })
                    .await?
            }
            None => self.write_frame(WsMessage::Text(payload.clone()), deadline).await?,
        }

        debug!("Payload: {}", payload);
        Ok(())
    }

    pub(crate) async fn request_identity(self: &Arc<Self>) -> Result<()> {
        self.send(OutboundMessage::get_id()).await
    }

    /// Write one frame under the write lock with a deadline
    ///
    /// Any failure hands the transport to `handle_disconnect`.
    pub(crate) async fn write_frame(self: &Arc<Self>, frame: WsMessage, deadline: Duration) -> Result<()> {
        let result = {
            let mut writer = self.writer.lock().await;
            let state = self.state.get();
            let sink = match writer.as_mut() {
                Some(sink) if state == ConnectionState::Connected => sink,
                _ => return Err(WireError::NotConnected(state)),
            };
            match tokio::time::timeout(deadline, sink.send(frame)).await {
                Ok(result) => result,
                Err(_) => Err(WireError::Timeout(format!(
                    "write did not complete within {:?}",
                    deadline
                ))),
            }
        };

        match result {
            Ok(()) => {
                *self.last_write.lock() = Some(Instant::now());
                self.metrics.increment_sent();
                Ok(())
            }
            Err(e) => {
                error!("Failed to send message: {}", e);
                self.handle_disconnect(format!("write failed: {}", e));
                Err(e)
            }
        }
    }

    /// Connected → Reconnecting, then start the supervisor
    ///
    /// Safe to call from any task; only the caller that wins the transition
    /// has an effect.
    pub(crate) fn handle_disconnect(self: &Arc<Self>, reason: String) {
        if !self
            .state
            .transition(ConnectionState::Connected, ConnectionState::Reconnecting)
        {
            debug!("Ignoring disconnect ({}), session is {:?}", reason, self.state.get());
            return;
        }

        warn!("Connection lost: {}", reason);
        self.emit(SessionEvent::ConnectionLost { reason });

        if self.reconnecting.swap(true, Ordering::AcqRel) {
            debug!("Reconnect supervisor already running");
            return;
        }
        tokio::spawn(supervisor::run(Arc::clone(self)));
    }

    /// Answer a transport ping within the ping timeout
    pub(crate) async fn on_ping(self: &Arc<Self>, payload: Vec<u8>) {
        debug!("Received ping, sending pong");
        self.liveness.extend_read_deadline();
        match self.write_frame(WsMessage::Pong(payload), self.config.ping_timeout).await {
            Ok(()) => self.liveness.extend_read_deadline(),
            Err(e) => debug!("Pong not sent: {}", e),
        }
    }

    pub(crate) fn on_pong(&self) {
        debug!("Received pong");
        self.liveness.record_pong_received();
        self.liveness.extend_read_deadline();
    }

    /// Transport-level heartbeat ping
    pub(crate) async fn send_ping(self: &Arc<Self>) -> Result<()> {
        self.write_frame(WsMessage::Ping(Vec::new()), self.config.ping_timeout)
            .await?;
        self.liveness.record_ping_sent();
        self.liveness.extend_read_deadline();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let previous = self.state.close();
        if previous == ConnectionState::Closed {
            debug!("Session already closed");
            return Ok(());
        }

        info!("Closing session");
        self.shutdown.trigger();

        if let Some(cancel) = self.read_cancel.lock().take() {
            let _ = cancel.send(());
        }

        let sink = self.writer.lock().await.take();
        if let Some(mut sink) = sink {
            let deadline = self.config.write_timeout;
            match tokio::time::timeout(deadline, sink.send(WsMessage::normal_close())).await {
                Ok(Ok(())) => debug!("Sent close frame"),
                Ok(Err(e)) => warn!("Failed to send close frame: {}", e),
                Err(_) => warn!("Timed out sending close frame"),
            }
            if let Ok(Err(e)) = tokio::time::timeout(deadline, sink.close()).await {
                debug!("Error closing transport: {}", e);
            }
        }

        self.emit(SessionEvent::Closed);
        info!("Session closed");
        Ok(())
    }
}

impl std::fmt::Debug for ConnectionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSession")
            .field("url", &self.inner.config.url)
            .field("state", &self.inner.state.get())
            .finish()
    }
}
