pub mod states;

use crate::core::config::{HeartbeatMode, SessionConfig};
use crate::core::session::ConnectionSession;
use crate::core::transport::TungsteniteConnector;
use crate::dispatch::queue::InboundReceiver;
use crate::ratelimit::RateLimiter;
use crate::traits::*;
use states::*;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

/// Type-state builder for ConnectionSession
///
/// The endpoint URL must be set before `build()` is available. Everything
/// else has a default: the tungstenite connector, the standard backoff
/// schedule and no rate limiting.
pub struct SessionBuilder<U: UrlState> {
    _state: PhantomData<U>,
    config: SessionConfig,
    connector: Option<Arc<dyn Connector>>,
    reconnect_strategy: Option<Arc<dyn ReconnectionStrategy>>,
    rate_limiter: Option<Arc<RateLimiter>>,
}

impl SessionBuilder<NoUrl> {
    /// Create a new builder instance
    pub fn new() -> Self {
        Self {
            _state: PhantomData,
            config: SessionConfig::new(String::new()),
            connector: None,
            reconnect_strategy: None,
            rate_limiter: None,
        }
    }

    pub fn url(self, url: impl Into<String>) -> SessionBuilder<HasUrl> {
        let mut config = self.config;
        config.url = url.into();
        SessionBuilder {
            _state: PhantomData,
            config,
            connector: self.connector,
            reconnect_strategy: self.reconnect_strategy,
            rate_limiter: self.rate_limiter,
        }
    }
}

impl Default for SessionBuilder<NoUrl> {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBuilder<HasUrl> {
    /// Start from a complete configuration (URL included)
    pub fn from_config(config: SessionConfig) -> Self {
        Self {
            _state: PhantomData,
            config,
            connector: None,
            reconnect_strategy: None,
            rate_limiter: None,
        }
    }

    /// Build the session and the receiver for its inbound frames
    ///
    /// The session starts Disconnected; call `connect()` to go live.
    pub fn build(self) -> Result<(ConnectionSession, InboundReceiver)> {
        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(TungsteniteConnector));
        let strategy = self
            .reconnect_strategy
            .unwrap_or_else(|| Arc::new(BackoffSchedule::default()));
        ConnectionSession::new(self.config, connector, strategy, self.rate_limiter)
    }
}

impl<U: UrlState> SessionBuilder<U> {
    /// Transport factory (defaults to tokio-tungstenite)
    pub fn connector(mut self, connector: impl Connector) -> Self {
        self.connector = Some(Arc::new(connector));
        self
    }

    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Arc::new(strategy));
        self
    }

    /// Rate limiter shared with other sessions or callers
    pub fn rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.ping_interval = interval;
        self
    }

    pub fn ping_timeout(mut self, timeout: Duration) -> Self {
        self.config.ping_timeout = timeout;
        self
    }

    /// Heartbeat interval and what each tick sends
    pub fn heartbeat(mut self, interval: Duration, mode: HeartbeatMode) -> Self {
        self.config.heartbeat_interval = interval;
        self.config.heartbeat_mode = mode;
        self
    }

    pub fn inbound_buffer(mut self, capacity: usize) -> Self {
        self.config.inbound_buffer = capacity;
        self
    }
}
