//! Rate limiting middleware
//!
//! Fixed-window throttle shared by the bot handlers and the REST API.
//! Exceeding the window budget maps to `RateLimited` (HTTP 429).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::utils::errors::{KosError, Result};

/// Rate limit configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window: Duration::from_secs(60),
        }
    }
}

#[derive(Debug)]
struct WindowSlot {
    window_start: Instant,
    count: u32,
}

/// Fixed-window rate limiter keyed by client identity.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    slots: Arc<Mutex<HashMap<String, WindowSlot>>>,
    exempt_ids: Vec<String>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, exempt_ids: Vec<String>) -> Self {
        Self {
            config,
            slots: Arc::new(Mutex::new(HashMap::new())),
            exempt_ids,
        }
    }

    /// Check and record one request for a client key.
    pub fn check(&self, key: &str) -> Result<()> {
        if self.exempt_ids.iter().any(|id| id == key) {
            debug!(key = key, "Client exempt from rate limiting");
            return Ok(());
        }

        let now = Instant::now();
        let mut slots = self.slots.lock().unwrap();
        let slot = slots.entry(key.to_string()).or_insert(WindowSlot {
            window_start: now,
            count: 0,
        });

        if now.duration_since(slot.window_start) >= self.config.window {
            slot.window_start = now;
            slot.count = 0;
        }

        if slot.count >= self.config.max_requests {
            warn!(key = key, "Rate limit exceeded");
            return Err(KosError::RateLimited);
        }

        slot.count += 1;
        Ok(())
    }

    /// Drop windows that ended long ago; called from the sweep loop.
    pub fn cleanup(&self) {
        let now = Instant::now();
        let mut slots = self.slots.lock().unwrap();
        let horizon = self.config.window * 2;
        slots.retain(|_, slot| now.duration_since(slot.window_start) < horizon);
        debug!(remaining = slots.len(), "Cleaned up rate limit windows");
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default(), vec![])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn enforces_window_budget() {
        let limiter = RateLimiter::new(
            RateLimitConfig {
                max_requests: 3,
                window: Duration::from_secs(60),
            },
            vec![],
        );

        assert!(limiter.check("client").is_ok());
        assert!(limiter.check("client").is_ok());
        assert!(limiter.check("client").is_ok());
        assert_matches!(limiter.check("client"), Err(KosError::RateLimited));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new(
            RateLimitConfig {
                max_requests: 1,
                window: Duration::from_secs(60),
            },
            vec![],
        );

        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("b").is_ok());
        assert_matches!(limiter.check("a"), Err(KosError::RateLimited));
    }

    #[test]
    fn exempt_clients_are_never_limited() {
        let limiter = RateLimiter::new(
            RateLimitConfig {
                max_requests: 1,
                window: Duration::from_secs(60),
            },
            vec!["42".to_string()],
        );

        assert!(limiter.check("42").is_ok());
        assert!(limiter.check("42").is_ok());
        assert!(limiter.check("42").is_ok());
    }

    #[test]
    fn window_resets_after_elapsing() {
        let limiter = RateLimiter::new(
            RateLimitConfig {
                max_requests: 1,
                window: Duration::from_millis(20),
            },
            vec![],
        );

        assert!(limiter.check("client").is_ok());
        assert_matches!(limiter.check("client"), Err(KosError::RateLimited));
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check("client").is_ok());
    }

    #[test]
    fn cleanup_drops_stale_windows() {
        let limiter = RateLimiter::new(
            RateLimitConfig {
                max_requests: 5,
                window: Duration::from_millis(10),
            },
            vec![],
        );

        limiter.check("stale").unwrap();
        std::thread::sleep(Duration::from_millis(30));
        limiter.cleanup();
        assert!(limiter.slots.lock().unwrap().is_empty());
    }
}
