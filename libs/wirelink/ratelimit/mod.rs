//! Outbound rate limiting
//!
//! One token bucket per route plus a global fallback bucket. See
//! [`bucket`] for the refill arithmetic.

pub mod bucket;
pub mod limiter;
pub mod middleware;

pub use bucket::{BucketState, Rate, TokenBucket};
pub use limiter::{RateLimiter, WaitPolicy};
pub use middleware::RateLimitMiddleware;
