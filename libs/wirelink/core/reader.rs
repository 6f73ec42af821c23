//! Per-transport read loop
//!
//! One loop runs per installed transport. It exits on shutdown, when its
//! transport is retired, or on the first read failure. Only a loop whose
//! transport is still current reports the failure to the session.

use crate::core::events::SessionEvent;
use crate::core::liveness::Liveness;
use crate::core::session::SessionInner;
use crate::dispatch::queue::PushOutcome;
use crate::traits::*;
use crate::transport::{CLOSE_GOING_AWAY, CLOSE_NORMAL};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

pub(crate) async fn run(
    inner: Arc<SessionInner>,
    mut stream: Box<dyn TransportStream>,
    generation: u64,
    mut retired: oneshot::Receiver<()>,
) {
    debug!(generation, "Read loop started");

    let failure = loop {
        inner.liveness.extend_read_deadline();

        let next = tokio::select! {
            _ = inner.shutdown.wait() => {
                debug!("Shutdown detected in read loop");
                return;
            }
            _ = &mut retired => {
                debug!(generation, "Transport retired, read loop exiting");
                return;
            }
            next = read_with_deadline(&inner.liveness, stream.as_mut()) => next,
        };

        match next {
            Ok(WsMessage::Text(text)) => handle_text(&inner, &text),
            Ok(WsMessage::Binary(data)) => match String::from_utf8(data) {
                Ok(text) => handle_text(&inner, &text),
                Err(_) => warn!("Ignoring non-UTF-8 binary frame"),
            },
            Ok(WsMessage::Ping(payload)) => {
                let inner = Arc::clone(&inner);
                tokio::spawn(async move { inner.on_ping(payload).await });
            }
            Ok(WsMessage::Pong(_)) => inner.on_pong(),
            Ok(WsMessage::Close(frame)) => break classify_close(frame),
            Err(e) => break e,
        }
    };

    if failure.is_expected_close() {
        debug!("Connection closed: {}", failure);
    } else {
        error!("Read loop failed: {}", failure);
    }

    if inner.current_generation() == generation {
        inner.handle_disconnect(failure.to_string());
    } else {
        debug!(generation, "Stale read loop exiting");
    }
}

/// Read the next frame, failing once the read deadline passes unextended
async fn read_with_deadline(
    liveness: &Liveness,
    stream: &mut dyn TransportStream,
) -> Result<WsMessage> {
    loop {
        let deadline = liveness.read_deadline();
        match tokio::time::timeout_at(deadline, stream.next()).await {
            Ok(Some(result)) => return result,
            Ok(None) => return Err(WireError::ConnectionClosed("stream ended".into())),
            Err(_) => {
                // Pongs and heartbeats may have moved the deadline while we waited
                if liveness.read_deadline() > deadline {
                    continue;
                }
                return Err(WireError::Timeout("read deadline exceeded".into()));
            }
        }
    }
}

fn handle_text(inner: &SessionInner, text: &str) {
    inner.metrics.increment_received();
    debug!("Received message: {}", text);

    let frame = match InboundFrame::decode(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!("Ignoring malformed frame: {}", e);
            return;
        }
    };

    match inner.inbound().push(frame) {
        PushOutcome::Queued => {}
        PushOutcome::Dropped => {
            warn!("Inbound queue full, dropping frame");
            inner.metrics.increment_dropped();
            inner.emit(SessionEvent::FrameDropped);
        }
        PushOutcome::Closed => debug!("Inbound receiver gone, discarding frame"),
    }
}

fn classify_close(frame: Option<(u16, String)>) -> WireError {
    match frame {
        None => WireError::ConnectionClosed("closed without status".into()),
        Some((code, reason)) if code == CLOSE_NORMAL || code == CLOSE_GOING_AWAY => {
            WireError::ConnectionClosed(format!("close {}: {}", code, reason))
        }
        Some((code, reason)) => {
            WireError::Transport(format!("closed abnormally with code {}: {}", code, reason))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_close_classification() {
        assert!(classify_close(None).is_expected_close());
        assert!(classify_close(Some((1000, "bye".into()))).is_expected_close());
        assert!(classify_close(Some((1001, String::new()))).is_expected_close());

        let abnormal = classify_close(Some((1011, "server error".into())));
        assert!(!abnormal.is_expected_close());
        assert!(abnormal.is_transport_failure());
    }
}
