//! # Wirelink Traits
//!
//! Core traits and types shared by the session and its collaborators:
//!
//! - **Connector / TransportSink / TransportStream**: the duplex transport seam
//! - **ReconnectionStrategy**: backoff policy for the reconnect supervisor
//! - **SessionHandle**: what the dispatcher needs from a session
//! - **Command / CommandRegistry**: the chat command layer
//! - **OutboundMessage / InboundFrame**: the JSON wire format

pub mod command;
pub mod error;
pub mod message;
pub mod reconnect;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use command::{Command, CommandRegistry, CommandReply};
pub use error::{Result, WireError};
pub use message::{ChatFrame, Identity, InboundFrame, OutboundMessage, ACTION_GET_ID, ACTION_SEND_MESSAGE};
pub use reconnect::{BackoffSchedule, NeverReconnect, ReconnectionStrategy};
pub use session::SessionHandle;
pub use transport::{Connector, TransportPair, TransportSink, TransportStream, WsMessage};
