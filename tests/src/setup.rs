//! Common test setup functions.

use api::middleware::rate_limit::RateLimitConfig;
use api::{router, AppState};
use axum::Router;
use coordinator::{Coordinator, Notifier};
use std::sync::Arc;
use support_store::Database;
use telemetry::health;

use crate::fixtures;
use crate::mocks::MockNotifier;

/// Knobs for building a test context.
#[derive(Debug, Clone)]
pub struct TestOptions {
    pub admin_token: Option<String>,
    pub rate_limit: RateLimitConfig,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            admin_token: None,
            // Every request in a test comes from the same client.
            rate_limit: RateLimitConfig {
                rate: 1000.0,
                burst: 1000,
            },
        }
    }
}

/// Test context with a private in-memory database.
///
/// Production code paths throughout:
/// - The real Axum router with all middleware
/// - The real coordinator and SQLite store
/// - `MockNotifier` in place of the log/webhook dispatcher
pub struct TestContext {
    pub coordinator: Coordinator,
    pub notifier: Arc<MockNotifier>,
    pub router: Router,
}

impl TestContext {
    /// Create a new test context with the fixture agents seeded.
    pub async fn new() -> Self {
        Self::with_options(TestOptions::default()).await
    }

    pub async fn with_options(options: TestOptions) -> Self {
        let db = Database::open_in_memory()
            .await
            .expect("Failed to open in-memory database");
        health().database.set_healthy();
        health().notifier.set_healthy();

        let notifier = Arc::new(MockNotifier::new());
        let coordinator = Coordinator::new(db, notifier.clone() as Arc<dyn Notifier>);
        coordinator
            .seed_agents(fixtures::agents())
            .await
            .expect("Failed to seed agents");

        let state = AppState::new(coordinator.clone())
            .with_rate_limit(options.rate_limit)
            .with_admin_token(options.admin_token);
        let router = router(state);

        Self {
            coordinator,
            notifier,
            router,
        }
    }

    /// Context whose agent routes require the fixture admin token.
    pub async fn with_admin_token() -> Self {
        Self::with_options(TestOptions {
            admin_token: Some(fixtures::ADMIN_TOKEN.to_string()),
            ..TestOptions::default()
        })
        .await
    }
}
