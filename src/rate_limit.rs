//! Per-client request rate limiting
//!
//! 100 requests per rolling hour per originating IP by default. The check
//! runs before any core operation; an over-limit client sees 429 without
//! touching the stores. Timestamps are pruned lazily on each check, so an
//! idle client's window costs nothing.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

use crate::clock::Clock;

/// Sliding-window request counter keyed by client address
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    clients: DashMap<String, Vec<DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    pub fn new(max_requests: usize, window_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            max_requests,
            window: Duration::seconds(window_secs),
            clients: DashMap::new(),
            clock,
        }
    }

    /// Record one request for `key` and report whether it is allowed
    pub fn allow(&self, key: &str) -> bool {
        let now = self.clock.now();
        let cutoff = now - self.window;

        let mut stamps = self.clients.entry(key.to_string()).or_default();
        stamps.retain(|t| *t > cutoff);

        if stamps.len() < self.max_requests {
            stamps.push(now);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn limiter(max: usize, clock: &Arc<ManualClock>) -> RateLimiter {
        RateLimiter::new(max, 3600, Arc::clone(clock) as Arc<dyn Clock>)
    }

    #[test]
    fn test_allows_up_to_limit_then_rejects() {
        let clock = Arc::new(ManualClock::fixed());
        let limiter = limiter(100, &clock);

        for _ in 0..100 {
            assert!(limiter.allow("10.0.0.1"));
        }
        assert!(!limiter.allow("10.0.0.1"));
    }

    #[test]
    fn test_window_slides() {
        let clock = Arc::new(ManualClock::fixed());
        let limiter = limiter(2, &clock);

        assert!(limiter.allow("10.0.0.1"));
        clock.advance_secs(1800);
        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));

        // First request ages out after a full hour; the second has not
        clock.advance_secs(1900);
        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));
    }

    #[test]
    fn test_clients_are_independent() {
        let clock = Arc::new(ManualClock::fixed());
        let limiter = limiter(1, &clock);

        assert!(limiter.allow("10.0.0.1"));
        assert!(!limiter.allow("10.0.0.1"));
        assert!(limiter.allow("10.0.0.2"));
    }
}
