//! Background workers: idle-session reaper, backlog monitor, store probe.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use support_core::{now, Result};
use support_store::queries::sessions;
use telemetry::{health, metrics};
use tokio::time::interval;
use tracing::{error, info};

use crate::coordinator::Coordinator;
use crate::notify::Notification;
use crate::reaper::ReaperConfig;

/// Worker scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub reaper: ReaperConfig,
    /// Backlog check interval
    pub backlog_check_interval: Duration,
    /// Unassigned WAITING sessions above this raise an alert; 0 disables alerts
    pub backlog_threshold: u64,
    /// Database probe interval
    pub health_check_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reaper: ReaperConfig::default(),
            backlog_check_interval: Duration::from_secs(60),
            backlog_threshold: 0,
            health_check_interval: Duration::from_secs(15),
        }
    }
}

/// Background worker scheduler.
pub struct Scheduler {
    config: SchedulerConfig,
    coordinator: Coordinator,
    /// Set while the backlog is above threshold, so each crossing alerts once
    backlog_alerting: AtomicBool,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig, coordinator: Coordinator) -> Self {
        Self {
            config,
            coordinator,
            backlog_alerting: AtomicBool::new(false),
        }
    }

    /// Starts all background workers.
    pub fn start(self: Arc<Self>) -> Vec<tokio::task::JoinHandle<()>> {
        let mut handles = Vec::new();

        if self.config.reaper.enabled {
            let scheduler = self.clone();
            handles.push(tokio::spawn(async move {
                scheduler.run_reaper().await;
            }));
            info!(
                interval_secs = self.config.reaper.interval_secs,
                "Session reaper started"
            );
        }

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_backlog_monitor().await;
        }));

        let scheduler = self.clone();
        handles.push(tokio::spawn(async move {
            scheduler.run_health_probe().await;
        }));

        info!("Background workers started");
        handles
    }

    async fn run_reaper(&self) {
        let mut ticker = interval(Duration::from_secs(self.config.reaper.interval_secs.max(1)));

        loop {
            ticker.tick().await;

            if let Err(e) = self
                .coordinator
                .reap_idle_sessions(now(), self.config.reaper.batch_size)
                .await
            {
                error!("Reaper sweep error: {}", e);
            }
        }
    }

    async fn run_backlog_monitor(&self) {
        let mut ticker = interval(self.config.backlog_check_interval);

        loop {
            ticker.tick().await;

            if let Err(e) = self.check_backlog().await {
                error!("Backlog check error: {}", e);
            }
        }
    }

    async fn run_health_probe(&self) {
        let mut ticker = interval(self.config.health_check_interval);

        loop {
            ticker.tick().await;

            match support_store::check_connection(self.coordinator.database()).await {
                Ok(_) => health().database.set_healthy(),
                Err(e) => {
                    error!("Database health check failed: {}", e);
                    health().database.set_unhealthy(e.to_string());
                }
            }
        }
    }

    /// Publishes the unassigned backlog and alerts when it crosses the threshold.
    pub async fn check_backlog(&self) -> Result<u64> {
        let waiting = self
            .coordinator
            .read("count_backlog", sessions::count_unassigned_waiting)
            .await?;
        metrics().waiting_backlog.set(waiting);

        let threshold = self.config.backlog_threshold;
        let above = threshold > 0 && waiting > threshold;
        let was_above = self.backlog_alerting.swap(above, Ordering::Relaxed);
        if above && !was_above {
            self.coordinator
                .dispatch(Notification::WaitingBacklog { waiting, threshold });
        }
        Ok(waiting)
    }
}
