//! Token bucket
//!
//! ```text
//!     refill: tokens += elapsed * (limit / window), capped at burst
//!
//!     ┌──────────────┐
//!     │ ● ● ● ○ ○    │  3 / 5 tokens
//!     └──────────────┘
//!       acquire: tokens >= 1 ? take one : report time to next token
//! ```
//!
//! The arithmetic lives in [`BucketState`], which takes the current instant as
//! an argument so it can be driven by synthetic clocks in tests. [`TokenBucket`]
//! wraps it in its own async lock.

use crate::error::{Result, WireError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tokio::sync::Mutex;
use tracing::debug;

/// Allowance of a route: `limit` tokens per `window`, at most `burst` stored
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rate {
    pub limit: f64,
    pub burst: u32,
    #[serde(with = "duration_secs")]
    pub window: Duration,
}

impl Rate {
    /// Validated constructor
    pub fn new(limit: f64, burst: u32, window: Duration) -> Result<Self> {
        let rate = Self {
            limit,
            burst,
            window,
        };
        rate.validate()?;
        Ok(rate)
    }

    /// `limit` tokens per second
    pub fn per_second(limit: f64, burst: u32) -> Result<Self> {
        Self::new(limit, burst, Duration::from_secs(1))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.limit.is_finite() && self.limit > 0.0) {
            return Err(WireError::Configuration(format!(
                "rate limit must be positive, got {}",
                self.limit
            )));
        }
        if self.burst == 0 {
            return Err(WireError::Configuration("burst must be at least 1".into()));
        }
        if self.window.is_zero() {
            return Err(WireError::Configuration("window must be non-zero".into()));
        }
        // The longest refusal waits for one whole token
        if Duration::try_from_secs_f64(1.0 / self.tokens_per_second()).is_err() {
            return Err(WireError::Configuration(format!(
                "rate of {} per {:?} refills too slowly",
                self.limit, self.window
            )));
        }
        Ok(())
    }

    pub fn tokens_per_second(&self) -> f64 {
        self.limit / self.window.as_secs_f64()
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(d)?;
        Duration::try_from_secs_f64(secs).map_err(|e| {
            serde::de::Error::custom(format!("invalid window of {} seconds: {}", secs, e))
        })
    }
}

/// Token count and refill clock of one bucket
#[derive(Debug, Clone)]
pub struct BucketState {
    rate: Rate,
    tokens: f64,
    last_refill: Instant,
}

impl BucketState {
    /// A full bucket
    pub fn new(rate: Rate, now: Instant) -> Self {
        Self {
            rate,
            tokens: rate.burst as f64,
            last_refill: now,
        }
    }

    pub fn tokens(&self) -> f64 {
        self.tokens
    }

    pub fn rate(&self) -> &Rate {
        &self.rate
    }

    /// Credit the time elapsed since the last refill
    pub fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill);
        self.tokens = (self.tokens + elapsed.as_secs_f64() * self.rate.tokens_per_second())
            .min(self.rate.burst as f64);
        self.last_refill = now.max(self.last_refill);
    }

    /// Take one token if available, otherwise report the time until one is.
    /// A refusal leaves the token count untouched.
    pub fn try_take(&mut self, now: Instant) -> std::result::Result<(), Duration> {
        self.refill(now);
        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            return Ok(());
        }
        let missing = 1.0 - self.tokens;
        Err(Duration::try_from_secs_f64(missing / self.rate.tokens_per_second())
            .unwrap_or(Duration::MAX))
    }

    /// Record a token spent after waiting for it to accrue
    pub fn spend_after_wait(&mut self, now: Instant) {
        self.tokens = 0.0;
        self.last_refill = now.max(self.last_refill);
    }
}

/// One rate-limited counter behind its own lock
#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
}

impl TokenBucket {
    pub fn new(rate: Rate) -> Self {
        Self {
            state: Mutex::new(BucketState::new(rate, Instant::now())),
        }
    }

    /// Acquire a token
    ///
    /// Returns `(wait_time, granted)`. With `wait == false` a refusal returns
    /// immediately with the time until the next token. With `wait == true`
    /// the caller sleeps that long while holding this bucket's lock (so
    /// waiters on the same bucket are served in turn) and is then granted.
    pub async fn try_acquire(&self, wait: bool) -> (Duration, bool) {
        let mut state = self.state.lock().await;
        match state.try_take(Instant::now()) {
            Ok(()) => (Duration::ZERO, true),
            Err(time_to_next) if !wait => (time_to_next, false),
            Err(time_to_next) => {
                debug!("Waiting {:?} for token", time_to_next);
                tokio::time::sleep(time_to_next).await;
                state.spend_after_wait(Instant::now());
                (time_to_next, true)
            }
        }
    }

    /// Current token count (after refill)
    pub async fn available(&self) -> f64 {
        let mut state = self.state.lock().await;
        state.refill(Instant::now());
        state.tokens()
    }

    pub async fn rate(&self) -> Rate {
        *self.state.lock().await.rate()
    }
}
