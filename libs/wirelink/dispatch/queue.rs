//! Bounded inbound frame queue
//!
//! The read loop pushes without blocking: when the queue is full the newest
//! frame is dropped so a slow consumer can never stall transport reads.

use crate::message::InboundFrame;
use tokio::sync::mpsc;

/// Result of a non-blocking push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    Queued,
    /// Queue was full; the frame was discarded
    Dropped,
    /// Receiver is gone
    Closed,
}

/// Producer half, owned by the session
#[derive(Debug, Clone)]
pub struct InboundQueue {
    tx: mpsc::Sender<InboundFrame>,
}

/// Consumer half, handed to the dispatcher
#[derive(Debug)]
pub struct InboundReceiver {
    rx: mpsc::Receiver<InboundFrame>,
}

/// Create a queue holding at most `capacity` frames (minimum 1)
pub fn inbound_queue(capacity: usize) -> (InboundQueue, InboundReceiver) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (InboundQueue { tx }, InboundReceiver { rx })
}

impl InboundQueue {
    pub fn push(&self, frame: InboundFrame) -> PushOutcome {
        match self.tx.try_send(frame) {
            Ok(()) => PushOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => PushOutcome::Dropped,
            Err(mpsc::error::TrySendError::Closed(_)) => PushOutcome::Closed,
        }
    }

    pub fn capacity(&self) -> usize {
        self.tx.max_capacity()
    }
}

impl InboundReceiver {
    /// Next frame in arrival order; `None` once every producer is gone
    pub async fn recv(&mut self) -> Option<InboundFrame> {
        self.rx.recv().await
    }

    pub fn try_recv(&mut self) -> Option<InboundFrame> {
        self.rx.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
