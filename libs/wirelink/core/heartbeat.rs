//! Heartbeat for long-lived sessions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Heartbeat Task     │
//! │  (Tokio spawn)      │
//! │                     │
//! │  Every X interval:  │
//! │  1. Wait for tick   │
//! │  2. Skip unless     │
//! │     Connected       │
//! │  3. Ping / getId ───┼──> write lock ──> transport
//! │  4. Repeat          │
//! └─────────────────────┘
//! ```
//!
//! The interval is the configured heartbeat interval, floored at the ping
//! interval. A successful ping pushes the read deadline forward; a failed one
//! goes through the session's disconnect path.

use crate::core::config::HeartbeatMode;
use crate::core::connection_state::ConnectionState;
use crate::core::session::SessionInner;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Spawn the heartbeat task for a session
pub(crate) fn spawn_heartbeat(inner: Arc<SessionInner>) -> JoinHandle<()> {
    tokio::spawn(heartbeat_task(inner))
}

async fn heartbeat_task(inner: Arc<SessionInner>) {
    let interval = inner.config.effective_heartbeat_interval();
    let mut ticker = tokio::time::interval(interval);
    // Skip the first immediate tick - wait for the first interval
    ticker.tick().await;
    // If we miss ticks due to slow processing, skip them rather than bursting
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    debug!(
        "Heartbeat task started with interval: {:?} ({:?})",
        interval, inner.config.heartbeat_mode
    );

    loop {
        tokio::select! {
            _ = inner.shutdown.wait() => {
                debug!("Heartbeat task received shutdown signal");
                break;
            }
            _ = ticker.tick() => {}
        }

        match inner.state.get() {
            ConnectionState::Connected => {}
            ConnectionState::Closed => break,
            other => {
                debug!("Heartbeat skipped, session is {:?}", other);
                continue;
            }
        }

        debug!("Heartbeat tick");
        let result = match inner.config.heartbeat_mode {
            HeartbeatMode::TransportPing => inner.send_ping().await,
            HeartbeatMode::IdentityRequest => inner.request_identity().await.map(|()| {
                inner.liveness.extend_read_deadline();
            }),
        };

        match result {
            Ok(()) => debug!("Heartbeat sent"),
            Err(e) if e.is_transport_failure() => {
                error!("Heartbeat failed: {}", e);
                inner.handle_disconnect(format!("heartbeat failed: {}", e));
            }
            Err(e) => debug!("Heartbeat not sent: {}", e),
        }
    }

    debug!("Heartbeat task exiting");
}
