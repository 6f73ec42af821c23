//! Pending latency probe
//!
//! `ping` stamps the probe and asks for our identity; the next identity frame
//! takes the stamp and reports the round trip.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct LatencyProbe {
    issued_at: Mutex<Option<Instant>>,
}

impl LatencyProbe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a probe now (replaces any pending one)
    pub fn issue(&self) {
        self.issue_at(Instant::now());
    }

    pub fn issue_at(&self, at: Instant) {
        *self.issued_at.lock() = Some(at);
    }

    pub fn is_pending(&self) -> bool {
        self.issued_at.lock().is_some()
    }

    /// Clear the probe and return the time since it was issued
    pub fn take_elapsed(&self) -> Option<Duration> {
        self.issued_at.lock().take().map(|at| at.elapsed())
    }

    /// Drop a pending probe without measuring it
    pub fn cancel(&self) {
        self.issued_at.lock().take();
    }
}

/// Milliseconds with microsecond resolution, as shown in latency replies
pub fn latency_millis(elapsed: Duration) -> f64 {
    elapsed.as_micros() as f64 / 1000.0
}
