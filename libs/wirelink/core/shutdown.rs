//! Broadcast-once shutdown signal
//!
//! Triggered by `close()`. The read loop, the heartbeat ticker and any backoff
//! sleep select on [`ShutdownSignal::wait`] and return as soon as it fires.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

#[derive(Debug)]
pub struct ShutdownSignal {
    flag: AtomicBool,
    tx: watch::Sender<bool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            flag: AtomicBool::new(false),
            tx,
        }
    }

    /// Fire the signal. Returns false if it had already fired.
    pub fn trigger(&self) -> bool {
        if self.flag.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.tx.send_replace(true);
        true
    }

    #[inline]
    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Resolve once the signal has fired (immediately if it already has)
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // Sender lives in self, so the channel cannot close under us
        let _ = rx.wait_for(|fired| *fired).await;
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
