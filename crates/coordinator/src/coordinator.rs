//! The coordinator handle shared by every request handler and worker.

use std::sync::Arc;
use std::time::Instant;

use rusqlite::{Connection, Transaction};
use support_core::error::ConflictErrorCode;
use support_core::{Agent, AgentLoad, Result};
use support_store::queries::agents;
use support_store::Database;
use telemetry::{health, metrics};
use tracing::{error, info, warn};

use crate::notify::{Notification, Notifier};
use crate::settings::SettingsCache;

/// Entry point for every support operation.
///
/// Cheap to clone; all state lives in the database.
#[derive(Clone)]
pub struct Coordinator {
    db: Database,
    pub(crate) settings: SettingsCache,
    notifier: Arc<dyn Notifier>,
}

impl Coordinator {
    pub fn new(db: Database, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            db,
            settings: SettingsCache::new(),
            notifier,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Upserts the configured agent directory. Returns how many were written.
    pub async fn seed_agents(&self, seeds: Vec<Agent>) -> Result<usize> {
        let count = seeds.len();
        self.write("seed_agents", move |tx| {
            for agent in &seeds {
                agents::upsert_agent(tx, agent)?;
            }
            Ok(())
        })
        .await?;
        info!(count, "Seeded agent directory");
        Ok(count)
    }

    /// Assignable agents with their current load, in registration order.
    pub async fn list_agents(&self) -> Result<Vec<AgentLoad>> {
        self.read("list_agents", agents::assignable_agents_with_load)
            .await
    }

    /// Runs `f` in one transaction, recording latency and failures.
    pub(crate) async fn write<F, R>(&self, op: &'static str, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction<'_>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let started = Instant::now();
        let result = self.db.transaction(f).await;
        observe(op, started, &result);
        result
    }

    /// Runs a read-only closure outside an explicit transaction.
    pub(crate) async fn read<F, R>(&self, op: &'static str, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let started = Instant::now();
        let result = self.db.call(f).await;
        observe(op, started, &result);
        result
    }

    /// Delivers a notification off the request path. Failures are logged only.
    pub(crate) fn dispatch(&self, notification: Notification) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            match notifier.notify(&notification).await {
                Ok(()) => {
                    metrics().notifications_sent.inc();
                    health().notifier.set_healthy();
                }
                Err(e) => {
                    metrics().notification_errors.inc();
                    health().notifier.set_unhealthy(e.to_string());
                    warn!(error = %e, kind = notification.kind(), "Notification delivery failed");
                }
            }
        });
    }
}

fn observe<R>(op: &'static str, started: Instant, result: &Result<R>) {
    metrics()
        .store_latency_ms
        .observe(started.elapsed().as_millis() as u64);

    match result {
        Err(e) if e.error_code() == Some(ConflictErrorCode::ConcurrentModification.code()) => {
            metrics().concurrency_conflicts.inc();
            warn!(op, error = %e, "Concurrent modification");
        }
        Err(e) if e.is_internal() => {
            metrics().store_errors.inc();
            error!(op, error = %e, "Store operation failed");
        }
        _ => {}
    }
}
