//! Session store operations.

use support_core::error::ConflictErrorCode;
use support_core::{
    now, Agent, Error, NewSession, PageRequest, Pagination, Result, SenderType, Session,
    SessionFilter, SessionStatus, SessionUpdate, TransferFilter,
};
use support_store::queries::{agents, messages, sessions, transfers};
use telemetry::metrics;
use tracing::info;
use validator::Validate;

use crate::coordinator::Coordinator;
use crate::ops::{force_close_session, system_message, transition_session};
use crate::views::{SessionDetail, SessionListItem, SessionPage};

/// Listing query.
#[derive(Debug, Clone, Default)]
pub struct SessionQuery {
    pub filter: SessionFilter,
    pub page: PageRequest,
    /// Attach the latest message and unread visitor-message count
    pub admin_view: bool,
}

impl Coordinator {
    /// Opens a WAITING session with its welcome message, then tries to assign
    /// it. Assignment problems never fail the call.
    pub async fn create_session(&self, request: NewSession) -> Result<SessionDetail> {
        request.validate()?;
        let config = self.get_config().await?;

        let session = Session::new(request, now());
        let greeting = config.greeting().to_string();
        let session_id = session.session_id.clone();

        self.write("create_session", move |tx| {
            sessions::insert_session(tx, &session)?;
            system_message(tx, &session, greeting, session.created_at)?;
            Ok(())
        })
        .await?;

        metrics().sessions_created.inc();
        info!(session_id = %session_id, enabled = config.enabled, "Session created");

        if config.should_auto_assign() {
            self.auto_assign(&session_id, config.max_sessions_per_agent)
                .await;
        }

        self.get_session(&session_id).await
    }

    /// A session with its ordered message log and transfer history.
    pub async fn get_session(&self, id: &str) -> Result<SessionDetail> {
        let session_ref = id.to_string();
        self.read("get_session", move |conn| {
            let session = sessions::require_session(conn, &session_ref)?;
            let messages = messages::list_messages(conn, &session.id)?;
            let mut transfers = transfers::list_transfers(
                conn,
                &TransferFilter {
                    session_id: Some(session.id.clone()),
                    status: None,
                },
            )?;
            transfers.reverse();
            Ok(SessionDetail {
                session,
                messages,
                transfers,
            })
        })
        .await
    }

    /// Lists sessions newest first.
    pub async fn list_sessions(&self, query: SessionQuery) -> Result<SessionPage> {
        self.read("list_sessions", move |conn| {
            let (rows, total) = sessions::list_sessions(conn, &query.filter, query.page)?;
            let sessions = rows
                .into_iter()
                .map(|session| {
                    if !query.admin_view {
                        return Ok(SessionListItem {
                            session,
                            last_message: None,
                            unread_count: None,
                        });
                    }
                    let last_message = messages::latest_message(conn, &session.id)?;
                    let unread = messages::count_unread(conn, &session.id, SenderType::User)?;
                    Ok(SessionListItem {
                        session,
                        last_message,
                        unread_count: Some(unread),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            Ok(SessionPage {
                sessions,
                pagination: Pagination::new(query.page, total),
            })
        })
        .await
    }

    /// Partial update. Validation runs before any write, and every side effect
    /// commits in the same transaction.
    pub async fn update_session(&self, id: &str, update: SessionUpdate) -> Result<SessionDetail> {
        update.validate()?;
        let config = self.get_config().await?;
        let session_ref = id.to_string();

        let session_id = self
            .write("update_session", move |tx| {
                let at = now();
                let mut session = sessions::require_session(tx, &session_ref)?;

                if let Some(expected) = update.expected_version {
                    if expected != session.version {
                        return Err(Error::conflict(
                            ConflictErrorCode::ConcurrentModification,
                            format!(
                                "Session {} is at version {}, not {expected}",
                                session.session_id, session.version
                            ),
                        ));
                    }
                }

                let mut dirty = false;
                if let Some(priority) = update.priority {
                    dirty |= session.priority != priority;
                    session.priority = priority;
                }
                if let Some(subject) = update.subject {
                    session.subject = Some(subject);
                    dirty = true;
                }
                if let Some(department) = update.department {
                    session.department = Some(department);
                    dirty = true;
                }

                let was_terminal = session.status.is_terminal();
                match update.assigned_to {
                    Some(_) if was_terminal => {
                        return Err(Error::conflict(
                            ConflictErrorCode::SessionEnded,
                            format!("Session {} has ended", session.session_id),
                        ));
                    }
                    Some(Some(agent_id)) => {
                        let agent =
                            Agent::require_assignable(agents::get_agent(tx, &agent_id)?, "assignedTo")?;
                        dirty |= session.assign(&agent.id, at);
                    }
                    Some(None) => dirty |= session.unassign(),
                    None => {}
                }

                let target = update.status.unwrap_or(session.status);
                let closes = target == SessionStatus::Closed;
                if update.rating.is_some() || update.feedback.is_some() {
                    // Rating may ride along with the update that closes the session.
                    let mut preview = session.clone();
                    if closes {
                        preview.status = SessionStatus::Closed;
                    }
                    preview.rate(update.rating, update.feedback.clone(), config.allow_rating)?;
                    session.rating = preview.rating;
                    session.feedback = preview.feedback;
                    dirty = true;
                }

                let log = transition_session(tx, &mut session, target, at)?;
                if log.is_empty() && dirty {
                    session.touch(at);
                    sessions::update_session(tx, &mut session)?;
                }
                Ok(session.session_id)
            })
            .await?;

        self.get_session(&session_id).await
    }

    /// Soft delete: forces the session to CLOSED, ABANDONED sessions included.
    /// A session that is already closed is returned unchanged.
    pub async fn delete_session(&self, id: &str) -> Result<SessionDetail> {
        let session_ref = id.to_string();
        let session_id = self
            .write("delete_session", move |tx| {
                let mut session = sessions::require_session(tx, &session_ref)?;
                force_close_session(tx, &mut session, now())?;
                Ok(session.session_id)
            })
            .await?;
        self.get_session(&session_id).await
    }
}
