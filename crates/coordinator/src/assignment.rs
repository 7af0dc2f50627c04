//! Assignment policy: hand a waiting session to the least-loaded agent that
//! still has capacity.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use support_core::error::ConflictErrorCode;
use support_core::{now, AgentLoad, Error, Result, Session, SessionStatus};
use support_store::queries::{agents, sessions};
use telemetry::metrics;
use tracing::{info, warn};

use crate::coordinator::Coordinator;
use crate::ops::system_message;
use crate::views::SessionDetail;

/// Picks the candidate with the lowest load strictly below `max_sessions`.
///
/// Ties go to the earliest candidate in `candidates`; callers should not rely
/// on that order.
pub fn select_agent(candidates: &[AgentLoad], max_sessions: u32) -> Option<&AgentLoad> {
    candidates
        .iter()
        .filter(|c| c.agent.is_assignable() && c.load < max_sessions)
        .min_by_key(|c| c.load)
}

/// Assigns a WAITING, unassigned session. Returns `None` when the session is
/// not eligible or no agent has capacity.
pub(crate) fn assign_waiting(
    conn: &Connection,
    session_ref: &str,
    max_sessions: u32,
    now: DateTime<Utc>,
) -> Result<Option<Session>> {
    let mut session = sessions::require_session(conn, session_ref)?;
    if session.status != SessionStatus::Waiting || session.assigned_to.is_some() {
        return Ok(None);
    }

    let candidates = agents::assignable_agents_with_load(conn)?;
    let Some(choice) = select_agent(&candidates, max_sessions) else {
        return Ok(None);
    };
    let agent = choice.agent.clone();

    session.assign(&agent.id, now);
    session.transition(SessionStatus::Active, now)?;
    sessions::update_session(conn, &mut session)?;
    system_message(conn, &session, format!("Session assigned to {}", agent.name), now)?;

    info!(
        session_id = %session.session_id,
        agent_id = %agent.id,
        load = choice.load + 1,
        "Session assigned"
    );
    Ok(Some(session))
}

impl Coordinator {
    /// Best-effort assignment used on session creation. Never fails: errors are
    /// logged and treated as "no agent available".
    pub(crate) async fn auto_assign(&self, session_id: &str, max_sessions: u32) -> Option<Session> {
        let session_ref = session_id.to_string();
        let outcome = self
            .write("auto_assign", move |tx| {
                assign_waiting(tx, &session_ref, max_sessions, now())
            })
            .await;

        match outcome {
            Ok(Some(session)) => {
                metrics().auto_assignments.inc();
                Some(session)
            }
            Ok(None) => {
                metrics().auto_assignment_misses.inc();
                info!(session_id, "No agent available, session stays WAITING");
                None
            }
            Err(e) => {
                metrics().auto_assignment_errors.inc();
                warn!(session_id, error = %e, "Auto-assignment failed, session stays WAITING");
                None
            }
        }
    }

    /// Runs the assignment policy for one session on demand.
    ///
    /// Store errors surface; finding no agent returns the unchanged session.
    pub async fn assign_session(&self, id: &str) -> Result<SessionDetail> {
        let config = self.get_config().await?;
        let session_ref = id.to_string();
        let max_sessions = config.max_sessions_per_agent;

        let assigned = self
            .write("assign_session", move |tx| {
                let session = sessions::require_session(tx, &session_ref)?;
                if session.status != SessionStatus::Waiting || session.assigned_to.is_some() {
                    return Err(Error::conflict(
                        ConflictErrorCode::InvalidTransition,
                        format!(
                            "Session {} is not waiting for an agent",
                            session.session_id
                        ),
                    ));
                }
                assign_waiting(tx, &session.id, max_sessions, now())
            })
            .await?;

        match assigned {
            Some(_) => metrics().auto_assignments.inc(),
            None => metrics().auto_assignment_misses.inc(),
        }
        self.get_session(id).await
    }
}
