use crate::error::{Result, WireError};
use std::time::Duration;

/// Default reconnection delays: 1s, 2s, 5s, 10s, 30s, 60s
pub const DEFAULT_BACKOFF_SECS: [u64; 6] = [1, 2, 5, 10, 30, 60];

/// Default reconnection attempt budget
pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

/// Trait for defining reconnection strategies
///
/// Implement this trait to control how the supervisor behaves after a
/// disconnection.
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before the next reconnection attempt
    ///
    /// # Arguments
    /// * `attempt` - The reconnection attempt number (0-indexed)
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Stop reconnecting
    fn next_delay(&self, attempt: usize) -> Option<Duration>;

    /// Check if we should continue reconnecting
    fn should_reconnect(&self, attempt: usize) -> bool;

    /// Attempt budget, `None` when unbounded
    fn max_attempts(&self) -> Option<usize>;
}

/// Table-driven backoff
///
/// Attempt N waits `delays[min(N, len - 1)]`; the table must be non-empty and
/// non-decreasing, so the last entry acts as the cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffSchedule {
    delays: Vec<Duration>,
    max_attempts: usize,
}

impl BackoffSchedule {
    /// Create a schedule from explicit delays
    ///
    /// Fails when `delays` is empty or decreases anywhere.
    pub fn new(delays: Vec<Duration>, max_attempts: usize) -> Result<Self> {
        if delays.is_empty() {
            return Err(WireError::Configuration(
                "backoff schedule must contain at least one delay".into(),
            ));
        }
        if delays.windows(2).any(|w| w[1] < w[0]) {
            return Err(WireError::Configuration(
                "backoff schedule must be non-decreasing".into(),
            ));
        }
        Ok(Self {
            delays,
            max_attempts,
        })
    }

    /// The default schedule with the given attempt budget
    pub fn with_max_attempts(max_attempts: usize) -> Self {
        Self {
            delays: DEFAULT_BACKOFF_SECS
                .iter()
                .map(|s| Duration::from_secs(*s))
                .collect(),
            max_attempts,
        }
    }

    /// Delay for an attempt, clamped to the last entry
    pub fn delay_for(&self, attempt: usize) -> Duration {
        let idx = attempt.min(self.delays.len() - 1);
        self.delays[idx]
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        Self::with_max_attempts(DEFAULT_MAX_ATTEMPTS)
    }
}

impl ReconnectionStrategy for BackoffSchedule {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }
        Some(self.delay_for(attempt))
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        attempt < self.max_attempts
    }

    fn max_attempts(&self) -> Option<usize> {
        Some(self.max_attempts)
    }
}

/// Never reconnect strategy
///
/// A lost connection settles into Disconnected immediately.
#[derive(Debug, Clone)]
pub struct NeverReconnect;

impl ReconnectionStrategy for NeverReconnect {
    fn next_delay(&self, _attempt: usize) -> Option<Duration> {
        None
    }

    fn should_reconnect(&self, _attempt: usize) -> bool {
        false
    }

    fn max_attempts(&self) -> Option<usize> {
        Some(0)
    }
}
