//! Marks sessions with no recent activity as ABANDONED.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use support_core::{Result, SessionStatus};
use support_store::queries::sessions;
use tracing::{debug, info, warn};

use crate::coordinator::Coordinator;
use crate::ops::transition_session;

/// Reaper settings, read from the `[reaper]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReaperConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Sessions examined per sweep
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_interval_secs() -> u64 {
    60
}

fn default_batch_size() -> u32 {
    100
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: default_interval_secs(),
            batch_size: default_batch_size(),
        }
    }
}

impl Coordinator {
    /// One sweep. Sessions idle for longer than the configured timeout become
    /// ABANDONED, each in its own transaction. Returns how many were reaped.
    pub async fn reap_idle_sessions(&self, at: DateTime<Utc>, batch_size: u32) -> Result<usize> {
        let config = self.get_config().await?;
        let cutoff = at - TimeDelta::minutes(i64::from(config.session_timeout_minutes));

        let idle = self
            .read("find_idle_sessions", move |conn| {
                sessions::find_idle_sessions(conn, cutoff, batch_size)
            })
            .await?;

        let mut reaped = 0;
        for candidate in idle {
            let session_ref = candidate.id.clone();
            let seen_version = candidate.version;
            let outcome = self
                .write("reap_session", move |tx| {
                    let mut session = sessions::require_session(tx, &session_ref)?;
                    // Skip anything that moved since the scan.
                    if session.version != seen_version
                        || session.status.is_terminal()
                        || session.last_activity_at >= cutoff
                    {
                        return Ok(false);
                    }
                    transition_session(tx, &mut session, SessionStatus::Abandoned, at)?;
                    Ok(true)
                })
                .await;

            match outcome {
                Ok(true) => reaped += 1,
                Ok(false) => debug!(session_id = %candidate.session_id, "Session changed during sweep, skipped"),
                Err(e) => warn!(session_id = %candidate.session_id, error = %e, "Failed to reap session"),
            }
        }

        if reaped > 0 {
            info!(reaped, "Idle sessions marked abandoned");
        }
        Ok(reaped)
    }
}
