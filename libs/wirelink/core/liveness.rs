//! Read deadline and ping/pong bookkeeping
//!
//! Every kind of inbound traffic, every pong and every successful heartbeat
//! pushes the read deadline forward. The read loop treats a deadline that
//! passes without being extended as a transport failure.
//!
//! Timestamps are stored as milliseconds since an internal epoch so they can
//! live in atomics and be touched from any task without a lock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

pub struct Liveness {
    /// Epoch for converting Instant to u64
    epoch: Instant,
    /// Read deadline (ms since epoch)
    read_deadline_ms: AtomicU64,
    /// Last ping sent (ms since epoch, 0 = never)
    last_ping_sent_ms: AtomicU64,
    /// Last pong received (ms since epoch, 0 = never)
    last_pong_received_ms: AtomicU64,
    read_timeout: Duration,
}

impl Liveness {
    pub fn new(read_timeout: Duration) -> Self {
        Self {
            epoch: Instant::now(),
            read_deadline_ms: AtomicU64::new(read_timeout.as_millis() as u64),
            last_ping_sent_ms: AtomicU64::new(0),
            last_pong_received_ms: AtomicU64::new(0),
            read_timeout,
        }
    }

    fn now_ms(&self) -> u64 {
        // +1 keeps a reading taken right at the epoch distinct from "never"
        self.epoch.elapsed().as_millis() as u64 + 1
    }

    /// Push the read deadline to now + read timeout (never backwards)
    pub fn extend_read_deadline(&self) {
        let deadline = self.now_ms() + self.read_timeout.as_millis() as u64;
        self.read_deadline_ms.fetch_max(deadline, Ordering::AcqRel);
    }

    /// Current read deadline
    pub fn read_deadline(&self) -> Instant {
        self.epoch + Duration::from_millis(self.read_deadline_ms.load(Ordering::Acquire))
    }

    /// True once the deadline is behind us
    pub fn read_deadline_passed(&self) -> bool {
        Instant::now() >= self.read_deadline()
    }

    pub fn record_ping_sent(&self) {
        self.last_ping_sent_ms.store(self.now_ms(), Ordering::Release);
    }

    pub fn record_pong_received(&self) {
        self.last_pong_received_ms.store(self.now_ms(), Ordering::Release);
    }

    /// Time since the last pong, `None` if none was ever received
    pub fn time_since_last_pong(&self) -> Option<Duration> {
        self.since(self.last_pong_received_ms.load(Ordering::Acquire))
    }

    /// Time since the last ping, `None` if none was ever sent
    pub fn time_since_last_ping(&self) -> Option<Duration> {
        self.since(self.last_ping_sent_ms.load(Ordering::Acquire))
    }

    fn since(&self, stamp: u64) -> Option<Duration> {
        if stamp == 0 {
            return None;
        }
        Some(Duration::from_millis(self.now_ms().saturating_sub(stamp)))
    }

    /// Fresh transport: clear ping/pong history and restart the deadline
    pub fn reset(&self) {
        self.last_ping_sent_ms.store(0, Ordering::Release);
        self.last_pong_received_ms.store(0, Ordering::Release);
        let deadline = self.now_ms() + self.read_timeout.as_millis() as u64;
        self.read_deadline_ms.store(deadline, Ordering::Release);
    }
}
