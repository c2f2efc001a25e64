//! Rate limiting for login attempts.

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited,
}

/// Settings for the default in-memory limiter.
#[derive(Clone, Copy, Debug)]
pub struct RateLimitSettings {
    pub max_attempts: u32,
    pub window: Duration,
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Register an attempt for the key and decide whether it may proceed.
    async fn check_and_increment(&self, email: &str) -> RateLimitDecision;
}

#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

#[async_trait]
impl RateLimiter for NoopRateLimiter {
    async fn check_and_increment(&self, _email: &str) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }
}

/// In-memory sliding window keyed by email.
///
/// The whole key map sits behind one async mutex, so check-and-increment is
/// atomic across concurrent login attempts for the same email.
#[derive(Debug)]
pub struct SlidingWindowRateLimiter {
    limit: usize,
    window: Duration,
    attempts: Mutex<HashMap<String, Vec<Instant>>>,
}

impl SlidingWindowRateLimiter {
    #[must_use]
    pub fn new(settings: RateLimitSettings) -> Self {
        Self {
            limit: settings.max_attempts as usize,
            window: settings.window,
            attempts: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RateLimiter for SlidingWindowRateLimiter {
    async fn check_and_increment(&self, email: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut attempts = self.attempts.lock().await;
        let entry = attempts.entry(email.to_string()).or_default();
        entry.retain(|at| now.duration_since(*at) < self.window);
        // Limited attempts still count against the window.
        entry.push(now);
        if entry.len() > self.limit {
            RateLimitDecision::Limited
        } else {
            RateLimitDecision::Allowed
        }
    }
}
