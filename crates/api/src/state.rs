//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use coordinator::Coordinator;

use crate::middleware::rate_limit::{RateLimitConfig, RateLimiter, SharedRateLimiter};

/// Buckets idle for longer than this are dropped by the cleanup task.
const RATE_LIMIT_BUCKET_MAX_AGE: Duration = Duration::from_secs(600);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Coordinator,
    /// Per-IP limiter for visitor session creation
    pub rate_limiter: SharedRateLimiter,
    /// Bearer token for agent/admin routes; `None` leaves them open
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            rate_limiter: Arc::new(RateLimiter::new(RateLimitConfig::default())),
            admin_token: None,
        }
    }

    pub fn with_rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_limiter = Arc::new(RateLimiter::new(config));
        self
    }

    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.filter(|t| !t.is_empty()).map(Arc::from);
        self
    }

    /// Start the rate limiter cleanup background task.
    pub fn start_rate_limiter_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let rate_limiter = self.rate_limiter.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300)); // 5 minutes
            loop {
                interval.tick().await;
                rate_limiter.cleanup(RATE_LIMIT_BUCKET_MAX_AGE);
            }
        })
    }
}
