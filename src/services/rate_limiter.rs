//! Rate limiter for login attempts
//!
//! Failed logins are counted per lower-cased email over a sliding window;
//! once the limit is reached further attempts for that email are refused
//! until old failures age out.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

const MAX_FAILURES: usize = 5;
const WINDOW_MINUTES: i64 = 15;

/// Login rate limiter
pub struct LoginRateLimiter {
    failures: RwLock<HashMap<String, Vec<DateTime<Utc>>>>,
    max_failures: usize,
    window: Duration,
}

impl LoginRateLimiter {
    /// Five failures per fifteen minutes
    pub fn new() -> Self {
        Self::with_limits(MAX_FAILURES, Duration::minutes(WINDOW_MINUTES))
    }

    pub fn with_limits(max_failures: usize, window: Duration) -> Self {
        Self {
            failures: RwLock::new(HashMap::new()),
            max_failures,
            window,
        }
    }

    /// Whether `email` has used up its failed attempts
    pub async fn is_limited(&self, email: &str) -> bool {
        let cutoff = Utc::now() - self.window;
        let failures = self.failures.read().await;
        failures
            .get(&email.to_lowercase())
            .map(|times| times.iter().filter(|t| **t > cutoff).count() >= self.max_failures)
            .unwrap_or(false)
    }

    pub async fn record_failure(&self, email: &str) {
        let cutoff = Utc::now() - self.window;
        let mut failures = self.failures.write().await;
        let times = failures.entry(email.to_lowercase()).or_default();
        times.retain(|t| *t > cutoff);
        times.push(Utc::now());
    }

    /// Forget failures for `email` after a successful login
    pub async fn clear(&self, email: &str) {
        self.failures.write().await.remove(&email.to_lowercase());
    }

    /// Drop failures older than the window, returning how many emails remain tracked
    pub async fn cleanup(&self) -> usize {
        let cutoff = Utc::now() - self.window;
        let mut failures = self.failures.write().await;
        failures.retain(|_, times| {
            times.retain(|t| *t > cutoff);
            !times.is_empty()
        });
        failures.len()
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
