use crate::core::connection_state::ConnectionState;
use std::time::Duration;
use thiserror::Error;

/// Main error type for wirelink
#[derive(Error, Debug)]
pub enum WireError {
    /// Handshake with the endpoint failed (returned to the caller of `connect`)
    #[error("Handshake failed: {0}")]
    Handshake(String),

    /// Read or write failure on an established transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// Peer closed the connection (expected close)
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Outbound payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Rate limiter rejected the acquisition
    #[error("Rate limit exceeded for route '{route}', retry after {retry_after:?}")]
    RateLimited { route: String, retry_after: Duration },

    /// Session is not in the Connected state
    #[error("Not connected (state: {0:?})")]
    NotConnected(ConnectionState),

    /// A read or write deadline elapsed
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Invalid state transition
    #[error("Invalid state transition: {0}")]
    InvalidState(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Channel send error
    #[error("Channel send error: {0}")]
    ChannelSend(String),
}

impl WireError {
    /// True for failures that end the transport and must go through the
    /// disconnect path.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            WireError::Transport(_) | WireError::ConnectionClosed(_) | WireError::Timeout(_)
        )
    }

    /// True when the peer ended the connection in an orderly way.
    pub fn is_expected_close(&self) -> bool {
        matches!(self, WireError::ConnectionClosed(_))
    }

    /// Retry-after hint carried by a rate-limit rejection
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            WireError::RateLimited { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }
}

/// Result type for wirelink operations
pub type Result<T> = std::result::Result<T, WireError>;
