//! Session core: connection lifecycle, read loop, heartbeat and reconnection
//!
//! ```text
//!            connect()                    transport failure
//! Disconnected ───────> Connecting ──> Connected ───────────> Reconnecting
//!      ^                    │              ^                    │    │
//!      └── handshake fails ─┘              └──── handshake ok ──┘    │
//!      └──────────────────────── attempts exhausted ─────────────────┘
//!
//!                 close() from any state ──> Closed
//! ```

pub mod builder;
pub mod config;
pub mod connection_state;
pub mod events;
pub mod liveness;
pub mod shutdown;
pub mod transport;

mod heartbeat;
mod reader;
mod session;
mod supervisor;

pub use builder::{states, SessionBuilder};
pub use config::{HeartbeatMode, SessionConfig};
pub use connection_state::{AtomicConnectionState, AtomicMetrics, ConnectionState};
pub use events::{Metrics, SessionEvent};
pub use liveness::Liveness;
pub use session::ConnectionSession;
pub use shutdown::ShutdownSignal;
pub use transport::TungsteniteConnector;
