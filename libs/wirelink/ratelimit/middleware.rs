use super::limiter::RateLimiter;
use crate::error::Result;
use std::future::Future;
use std::sync::Arc;

/// Runs an operation after the limiter admits its route
#[derive(Debug, Clone)]
pub struct RateLimitMiddleware {
    limiter: Arc<RateLimiter>,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self { limiter }
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Acquire for `route`, then run `op`
    ///
    /// A rejection is returned as-is; `op` is not run.
    pub async fn handle<F, Fut, T>(&self, route: &str, op: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.limiter.acquire(route).await?;
        op().await
    }
}
