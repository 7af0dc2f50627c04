//! Per-client token bucket rate limiting.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Token bucket rate limiter keyed by client.
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, TokenBucket>>,
    config: RateLimitConfig,
}

/// Limiter settings, read from the `[rate_limit]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Tokens replenished per second
    #[serde(default = "default_rate")]
    pub rate: f64,
    /// Burst size
    #[serde(default = "default_burst")]
    pub burst: u32,
}

fn default_rate() -> f64 {
    1.0
}

fn default_burst() -> u32 {
    10
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            rate: default_rate(),
            burst: default_burst(),
        }
    }
}

struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(burst: u32) -> Self {
        Self {
            tokens: f64::from(burst),
            last_update: Instant::now(),
        }
    }

    /// Takes one token, or returns the seconds until one is available.
    fn try_acquire(&mut self, rate: f64, burst: u32) -> Result<(), u64> {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;

        self.tokens = (self.tokens + elapsed * rate).min(f64::from(burst));

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            Ok(())
        } else if rate > 0.0 {
            Err(((1.0 - self.tokens) / rate).ceil().max(1.0) as u64)
        } else {
            Err(u64::MAX)
        }
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Consumes a token for `key`. On refusal returns the Retry-After seconds.
    pub fn check(&self, key: &str) -> Result<(), u64> {
        let mut buckets = self.buckets.lock();

        let bucket = buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.config.burst));

        bucket.try_acquire(self.config.rate, self.config.burst)
    }

    /// Clean up stale buckets.
    pub fn cleanup(&self, max_age: Duration) {
        let mut buckets = self.buckets.lock();
        let now = Instant::now();

        buckets.retain(|_, bucket| now.duration_since(bucket.last_update) < max_age);
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.lock().len()
    }
}

/// Shared rate limiter state.
pub type SharedRateLimiter = Arc<RateLimiter>;
