//! Reconnect supervisor
//!
//! At most one supervisor runs per session; `handle_disconnect` starts it
//! after winning the Connected → Reconnecting edge. It walks the backoff
//! schedule until a handshake succeeds, the session is closed, or the
//! attempt budget runs out (Reconnecting → Disconnected).

use crate::core::connection_state::ConnectionState;
use crate::core::events::SessionEvent;
use crate::core::session::SessionInner;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

enum Outcome {
    Restored,
    Aborted,
    Exhausted(usize),
}

pub(crate) async fn run(inner: Arc<SessionInner>) {
    let outcome = reconnect_loop(&inner).await;

    match outcome {
        Outcome::Restored => {}
        Outcome::Aborted => {
            inner.reconnecting.store(false, Ordering::Release);
            debug!("Reconnect supervisor stopped, session is {:?}", inner.state.get());
        }
        Outcome::Exhausted(attempts) => {
            inner.reconnecting.store(false, Ordering::Release);
            if inner
                .state
                .transition(ConnectionState::Reconnecting, ConnectionState::Disconnected)
            {
                error!("Max reconnection attempts reached ({}), giving up", attempts);
                inner.emit(SessionEvent::ReconnectExhausted { attempts });
            }
        }
    }
}

async fn reconnect_loop(inner: &Arc<SessionInner>) -> Outcome {
    let budget = inner
        .strategy
        .max_attempts()
        .map(|n| n.to_string())
        .unwrap_or_else(|| "unbounded".into());
    let mut attempt = 0;

    loop {
        if inner.state.get() != ConnectionState::Reconnecting {
            return Outcome::Aborted;
        }
        if !inner.strategy.should_reconnect(attempt) {
            return Outcome::Exhausted(attempt);
        }
        let delay = match inner.strategy.next_delay(attempt) {
            Some(delay) => delay,
            None => return Outcome::Exhausted(attempt),
        };

        info!(
            "Attempting reconnection in {:?} (attempt {}/{})",
            delay,
            attempt + 1,
            budget
        );
        inner.emit(SessionEvent::Reconnecting(attempt + 1));

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = inner.shutdown.wait() => return Outcome::Aborted,
        }

        inner.retire_transport().await;
        if inner.state.get() != ConnectionState::Reconnecting {
            return Outcome::Aborted;
        }

        match inner.establish().await {
            Ok(pair) => {
                // Cleared before the session goes Connected so the next
                // failure can start a fresh supervisor
                inner.reconnecting.store(false, Ordering::Release);
                if let Err(e) = inner.install(pair, ConnectionState::Reconnecting).await {
                    debug!("Reconnected transport discarded: {}", e);
                    return Outcome::Restored;
                }

                inner.metrics.increment_reconnects();
                info!("Successfully reconnected after {} attempt(s)", attempt + 1);
                inner.emit(SessionEvent::Reconnected {
                    attempts: attempt + 1,
                });

                if let Err(e) = inner.request_identity().await {
                    warn!("Identity request after reconnect failed: {}", e);
                }
                return Outcome::Restored;
            }
            Err(e) => {
                error!("Reconnection attempt {} failed: {}", attempt + 1, e);
                attempt += 1;
            }
        }
    }
}
