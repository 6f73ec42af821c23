use crate::message::Identity;
use std::time::Duration;

/// Observations published by the session and the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Handshake succeeded and the session is Connected
    Connected,
    /// Endpoint assigned our identity
    Identified(Identity),
    /// Latency probe answered
    Latency(Duration),
    /// Connected → Reconnecting edge (fires once per disconnection)
    ConnectionLost { reason: String },
    /// Reconnect attempt about to run (1-indexed)
    Reconnecting(usize),
    /// Supervisor restored the connection
    Reconnected { attempts: usize },
    /// Supervisor gave up; session is Disconnected
    ReconnectExhausted { attempts: usize },
    /// Handshake failed on a caller-initiated connect
    Disconnected,
    /// Session closed for good
    Closed,
    /// Inbound queue was full and a frame was dropped
    FrameDropped,
}

/// Snapshot of session counters
#[derive(Debug, Clone)]
pub struct Metrics {
    pub messages_sent: u64,
    pub messages_received: u64,
    pub frames_dropped: u64,
    pub reconnect_count: u64,
    pub connection_state: crate::core::ConnectionState,
    pub time_since_last_pong: Option<Duration>,
}
