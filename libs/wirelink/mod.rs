//! # Wirelink
//!
//! Persistent duplex chat sessions over WebSocket.
//!
//! - **ConnectionSession**: handshake, serialized writes, read deadline,
//!   heartbeat and a single reconnect supervisor with table-driven backoff
//! - **RateLimiter**: token buckets per route with a global fallback
//! - **InboundDispatcher**: routes inbound frames to identity tracking,
//!   latency replies and prefix-triggered chat commands
//!
//! ## Example
//!
//! ```rust,ignore
//! let (session, inbound) = wirelink::builder()
//!     .url("wss://chat.example.com")
//!     .heartbeat(Duration::from_secs(60), HeartbeatMode::TransportPing)
//!     .build()?;
//!
//! session.connect().await?;
//! session.start_heartbeat();
//!
//! session.send(OutboundMessage::send_message("hello")).await?;
//! ```

pub mod core;
pub mod dispatch;
pub mod ratelimit;
pub mod traits;

pub use crate::core::{
    ConnectionSession, ConnectionState, HeartbeatMode, Metrics, SessionBuilder, SessionConfig,
    SessionEvent, ShutdownSignal, TungsteniteConnector,
};
pub use dispatch::{CommandTable, InboundDispatcher, InboundReceiver, LatencyProbe};
pub use ratelimit::{Rate, RateLimitMiddleware, RateLimiter, WaitPolicy};
pub use traits::*;

/// Create a new session builder
///
/// ```ignore
/// let (session, inbound) = wirelink::builder()
///     .url("wss://chat.example.com")
///     .build()?;
/// ```
pub fn builder() -> SessionBuilder<crate::core::states::NoUrl> {
    SessionBuilder::new()
}
