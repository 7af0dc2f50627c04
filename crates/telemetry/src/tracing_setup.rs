//! Tracing setup for structured logging.

use serde::{Deserialize, Serialize};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration, read from the `[logging]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    /// Filter directive (e.g., "info", "coordinator=debug,tower_http=info")
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit one JSON object per line
    #[serde(default)]
    pub json: bool,
    /// Log span open/close events
    #[serde(default)]
    pub span_events: bool,
}

fn default_filter() -> String {
    "info".to_string()
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
            span_events: false,
        }
    }
}

impl TracingConfig {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    pub fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// `RUST_LOG` and `LOG_JSON` override the file values.
    pub fn merge_env(self) -> Self {
        let json = std::env::var("LOG_JSON")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(self.json);
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| self.filter.clone());
        self.with_filter(filter).with_json(json)
    }
}

/// Initialize tracing with the given configuration.
pub fn init_tracing(config: &TracingConfig) {
    let env_filter =
        EnvFilter::try_new(&config.filter).unwrap_or_else(|_| EnvFilter::new("info"));

    let span_events = if config.span_events {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    if config.json {
        let fmt_layer = fmt::layer()
            .json()
            .with_span_events(span_events)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = fmt::layer()
            .with_span_events(span_events)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }

    tracing::info!(filter = %config.filter, json = config.json, "Tracing initialized");
}
