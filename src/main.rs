//! Support Desk
//!
//! Live customer-support session coordinator:
//! - Visitor sessions with a persistent message log
//! - Least-loaded agent assignment under a per-agent cap
//! - Agent-to-agent transfer workflow
//! - Background reaper and backlog alerts

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::signal;
use tracing::{error, info, warn};

use api::middleware::rate_limit::RateLimitConfig;
use api::{router, AppState};
use coordinator::notify::NotificationChannel;
use coordinator::reaper::ReaperConfig;
use coordinator::{Coordinator, NotificationDispatcher, Notifier, Scheduler, SchedulerConfig};
use support_core::Agent;
use support_store::{check_connection, Database, StoreConfig};
use telemetry::{health, init_tracing, TracingConfig};

/// Notification settings, read from the `[notifications]` table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct NotificationConfig {
    /// Optional webhook receiving JSON alerts
    #[serde(default)]
    webhook_url: Option<String>,
    /// Unassigned WAITING sessions above this raise an alert; 0 disables
    #[serde(default)]
    backlog_threshold: u64,
    #[serde(default = "default_check_interval_secs")]
    check_interval_secs: u64,
}

fn default_check_interval_secs() -> u64 {
    60
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Config {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,

    /// Bearer token for agent/admin routes; unset leaves them open
    #[serde(default)]
    admin_token: Option<String>,

    #[serde(default)]
    database: StoreConfig,

    #[serde(default)]
    logging: TracingConfig,

    #[serde(default)]
    reaper: ReaperConfig,

    #[serde(default)]
    notifications: NotificationConfig,

    #[serde(default)]
    rate_limit: RateLimitConfig,

    /// Agent directory seeded at startup
    #[serde(default)]
    agents: Vec<Agent>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_token: None,
            database: StoreConfig::default(),
            logging: TracingConfig::default(),
            reaper: ReaperConfig::default(),
            notifications: NotificationConfig::default(),
            rate_limit: RateLimitConfig::default(),
            agents: Vec::new(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = load_config()?;

    init_tracing(&config.logging.clone().merge_env());

    info!("Starting Support Desk v{}", env!("CARGO_PKG_VERSION"));

    let db = Database::open(config.database.clone())
        .await
        .context("Failed to open support database")?;
    check_health(&db).await;

    let mut dispatcher =
        NotificationDispatcher::new().context("Failed to create notification client")?;
    if let Some(url) = config.notifications.webhook_url.clone().filter(|u| !u.is_empty()) {
        info!(url = %url, "Webhook notifications enabled");
        dispatcher = dispatcher.with_channel(NotificationChannel::Webhook { url });
    }
    // Healthy until a delivery fails
    health().notifier.set_healthy();

    let coordinator = Coordinator::new(db, Arc::new(dispatcher) as Arc<dyn Notifier>);

    if config.agents.is_empty() {
        warn!("No agents configured; sessions will wait until agents are seeded");
    } else {
        coordinator
            .seed_agents(config.agents.clone())
            .await
            .context("Failed to seed agents")?;
    }

    // Materialize the support configuration row
    let support_config = coordinator
        .get_config()
        .await
        .context("Failed to load support configuration")?;
    info!(
        enabled = support_config.enabled,
        auto_assignment = support_config.auto_assignment,
        max_sessions_per_agent = support_config.max_sessions_per_agent,
        "Loaded support configuration"
    );

    // Start background workers
    let scheduler = Arc::new(Scheduler::new(
        SchedulerConfig {
            reaper: config.reaper.clone(),
            backlog_check_interval: Duration::from_secs(
                config.notifications.check_interval_secs.max(1),
            ),
            backlog_threshold: config.notifications.backlog_threshold,
            ..SchedulerConfig::default()
        },
        coordinator.clone(),
    ));
    let _worker_handles = scheduler.start();

    // Create application state
    let state = AppState::new(coordinator)
        .with_rate_limit(config.rate_limit.clone())
        .with_admin_token(config.admin_token.clone());
    if state.admin_token.is_none() {
        warn!("No admin token configured; agent routes are unauthenticated");
    }

    // Start rate limiter cleanup background task
    let _rate_limiter_cleanup = state.start_rate_limiter_cleanup();
    info!("Started rate limiter cleanup task (every 5 minutes)");

    let app = router(state);

    // Start HTTP server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutdown complete");
    Ok(())
}

/// Load configuration from files and environment.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        // Start with defaults
        .add_source(config::Config::try_from(&Config::default())?)
        // Load from config file if exists
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // Override with environment variables, e.g. SUPPORT_DATABASE__PATH
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("SUPPORT")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Check database health on startup.
async fn check_health(db: &Database) {
    match check_connection(db).await {
        Ok(latency_ms) => {
            health().database.set_healthy();
            info!(latency_ms, "Database connection: healthy");
        }
        Err(e) => {
            health().database.set_unhealthy(e.to_string());
            error!(error = %e, "Database connection: unhealthy");
        }
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
