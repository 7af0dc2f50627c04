//! Support configuration access, cached in front of the singleton row.

use std::time::Duration;

use moka::future::Cache;
use support_core::{now, Result, SupportConfig, SupportConfigUpdate};
use support_store::queries::settings;
use tracing::info;
use validator::Validate;

use crate::coordinator::Coordinator;

/// Cache TTL for the configuration (5 seconds).
const SETTINGS_CACHE_TTL: Duration = Duration::from_secs(5);

const SETTINGS_KEY: &str = "support";

#[derive(Clone)]
pub(crate) struct SettingsCache {
    cache: Cache<&'static str, SupportConfig>,
}

impl SettingsCache {
    pub(crate) fn new() -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(SETTINGS_CACHE_TTL)
                .build(),
        }
    }
}

impl Coordinator {
    /// Current configuration. The first read materializes the defaults.
    pub async fn get_config(&self) -> Result<SupportConfig> {
        if let Some(cached) = self.settings.cache.get(SETTINGS_KEY).await {
            return Ok(cached);
        }

        let config = self
            .write("get_config", |tx| settings::get_or_create_settings(tx, now()))
            .await?;
        self.settings
            .cache
            .insert(SETTINGS_KEY, config.clone())
            .await;
        Ok(config)
    }

    /// Applies an administrative update. Concurrent updates are last-writer-wins.
    pub async fn update_config(&self, update: SupportConfigUpdate) -> Result<SupportConfig> {
        update.validate()?;

        let config = self
            .write("update_config", move |tx| {
                let at = now();
                let mut config = settings::get_or_create_settings(tx, at)?;
                config.apply(update, at);
                settings::save_settings(tx, &config)?;
                Ok(config)
            })
            .await?;

        self.settings
            .cache
            .insert(SETTINGS_KEY, config.clone())
            .await;
        info!(
            enabled = config.enabled,
            auto_assignment = config.auto_assignment,
            max_sessions_per_agent = config.max_sessions_per_agent,
            "Support configuration updated"
        );
        Ok(config)
    }
}
