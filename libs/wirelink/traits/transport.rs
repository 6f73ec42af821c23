//! Transport abstraction
//!
//! The session never talks to a socket library directly. A [`Connector`]
//! performs the handshake and hands back the two halves of the duplex
//! connection: a [`TransportSink`] that lives behind the session's single
//! write lock, and a [`TransportStream`] owned exclusively by the read loop.
//!
//! ```text
//! Connector::connect ──> (TransportSink, TransportStream)
//!                              │                 │
//!                     write lock (session)   read loop
//! ```

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Close code for a normal closure
pub const CLOSE_NORMAL: u16 = 1000;
/// Close code sent when the peer is going away
pub const CLOSE_GOING_AWAY: u16 = 1001;

/// A frame as seen by the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    /// Close frame with optional (code, reason)
    Close(Option<(u16, String)>),
}

impl WsMessage {
    /// Get the message as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            WsMessage::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Check if message is a data frame (text or binary)
    pub fn is_data(&self) -> bool {
        matches!(self, WsMessage::Text(_) | WsMessage::Binary(_))
    }

    /// Check if message is a control frame
    pub fn is_control(&self) -> bool {
        !self.is_data()
    }

    /// Normal-closure close frame
    pub fn normal_close() -> Self {
        WsMessage::Close(Some((CLOSE_NORMAL, String::new())))
    }
}

/// Write half of an established transport
#[async_trait]
pub trait TransportSink: Send + Sync + 'static {
    /// Write one frame. Deadlines are applied by the caller.
    async fn send(&mut self, message: WsMessage) -> Result<()>;

    /// Close the write half
    async fn close(&mut self) -> Result<()>;
}

/// Read half of an established transport
#[async_trait]
pub trait TransportStream: Send + Sync + 'static {
    /// Read the next frame. `None` means the stream ended.
    async fn next(&mut self) -> Option<Result<WsMessage>>;
}

/// Both halves of a freshly established transport
pub struct TransportPair {
    pub sink: Box<dyn TransportSink>,
    pub stream: Box<dyn TransportStream>,
}

impl TransportPair {
    pub fn new(sink: Box<dyn TransportSink>, stream: Box<dyn TransportStream>) -> Self {
        Self { sink, stream }
    }
}

/// Establishes transports to the endpoint
///
/// Called once by `connect()` and once per reconnect attempt; every call must
/// produce an independent transport.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Perform the handshake, failing after `handshake_timeout`
    async fn connect(&self, url: &str, handshake_timeout: Duration) -> Result<TransportPair>;
}
