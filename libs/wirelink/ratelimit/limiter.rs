use super::bucket::{Rate, TokenBucket};
use crate::error::{Result, WireError};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// What to do when a bucket is empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaitPolicy {
    /// Sleep until a token accrues
    #[default]
    Wait,
    /// Fail with `WireError::RateLimited`
    Reject,
}

/// Global bucket plus one bucket per configured route
///
/// Buckets are created here and never recreated; a route without its own
/// bucket draws from the global one. Each bucket has its own lock, so routes
/// never block each other.
#[derive(Debug)]
pub struct RateLimiter {
    global: TokenBucket,
    routes: HashMap<String, TokenBucket>,
    policy: WaitPolicy,
}

impl RateLimiter {
    pub fn new(global: Rate, policy: WaitPolicy) -> Result<Self> {
        global.validate()?;
        Ok(Self {
            global: TokenBucket::new(global),
            routes: HashMap::new(),
            policy,
        })
    }

    /// Add a route-specific bucket
    pub fn with_route(mut self, route: impl Into<String>, rate: Rate) -> Result<Self> {
        rate.validate()?;
        self.routes.insert(route.into(), TokenBucket::new(rate));
        Ok(self)
    }

    /// Build from a global rate and a route table
    pub fn from_rates(
        global: Rate,
        routes: impl IntoIterator<Item = (String, Rate)>,
        policy: WaitPolicy,
    ) -> Result<Self> {
        routes
            .into_iter()
            .try_fold(Self::new(global, policy)?, |limiter, (route, rate)| {
                limiter.with_route(route, rate)
            })
    }

    pub fn policy(&self) -> WaitPolicy {
        self.policy
    }

    /// True when `route` has its own bucket
    pub fn has_route(&self, route: &str) -> bool {
        self.routes.contains_key(route)
    }

    fn bucket(&self, route: &str) -> &TokenBucket {
        self.routes.get(route).unwrap_or(&self.global)
    }

    /// Non-blocking attempt: `(retry_after, granted)`
    pub async fn try_acquire(&self, route: &str) -> (Duration, bool) {
        self.bucket(route).try_acquire(false).await
    }

    /// Blocking attempt; returns how long it waited
    pub async fn wait(&self, route: &str) -> Duration {
        self.bucket(route).try_acquire(true).await.0
    }

    /// Acquire under the configured policy
    ///
    /// Under `Reject` an empty bucket yields `WireError::RateLimited` with the
    /// route and retry-after. The limiter never retries on its own.
    pub async fn acquire(&self, route: &str) -> Result<Duration> {
        match self.policy {
            WaitPolicy::Wait => Ok(self.wait(route).await),
            WaitPolicy::Reject => {
                let (retry_after, granted) = self.try_acquire(route).await;
                if granted {
                    Ok(Duration::ZERO)
                } else {
                    debug!("Rate limited on route {}, retry after {:?}", route, retry_after);
                    Err(WireError::RateLimited {
                        route: route.to_string(),
                        retry_after,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rate(limit: f64, burst: u32) -> Rate {
        Rate::per_second(limit, burst).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregistered_route_uses_global() {
        let limiter = RateLimiter::new(rate(1.0, 1), WaitPolicy::Reject)
            .unwrap()
            .with_route("sendMessage", rate(1.0, 3))
            .unwrap();

        assert!(limiter.acquire("getId").await.is_ok());
        // Global bucket is now empty, shared by every unregistered route
        let err = limiter.acquire("somethingElse").await.unwrap_err();
        match err {
            WireError::RateLimited { route, retry_after } => {
                assert_eq!(route, "somethingElse");
                assert!(retry_after > Duration::ZERO);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Route bucket is independent
        for _ in 0..3 {
            assert!(limiter.acquire("sendMessage").await.is_ok());
        }
        assert!(limiter.acquire("sendMessage").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_policy_never_rejects() {
        let limiter = RateLimiter::new(rate(10.0, 1), WaitPolicy::Wait).unwrap();
        let mut waited = Duration::ZERO;
        for _ in 0..5 {
            waited += limiter.acquire("any").await.unwrap();
        }
        assert!(waited >= Duration::from_millis(350));
    }

    #[tokio::test]
    async fn test_from_rates() {
        let limiter = RateLimiter::from_rates(
            rate(5.0, 5),
            vec![("getId".to_string(), rate(1.0, 1))],
            WaitPolicy::Reject,
        )
        .unwrap();
        assert!(limiter.has_route("getId"));
        assert!(!limiter.has_route("sendMessage"));
        assert_eq!(limiter.policy(), WaitPolicy::Reject);
    }

    #[test]
    fn test_invalid_route_rate() {
        let bad = Rate {
            limit: 1.0,
            burst: 0,
            window: Duration::from_secs(1),
        };
        let limiter = RateLimiter::new(rate(1.0, 1), WaitPolicy::Wait).unwrap();
        assert!(limiter.with_route("x", bad).is_err());
    }
}
