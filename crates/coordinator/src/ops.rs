//! Synchronous building blocks that run inside a coordinator transaction.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use support_core::{Message, Result, Session, SessionStatus, TransferStatus};
use support_store::queries::{agents, messages, sessions, transfers};
use telemetry::metrics;
use tracing::info;

/// Appends a SYSTEM message to the session's log.
pub(crate) fn system_message(
    conn: &Connection,
    session: &Session,
    text: impl Into<String>,
    now: DateTime<Utc>,
) -> Result<Message> {
    let mut message = Message::system(&session.id, text, now);
    messages::insert_message(conn, &mut message)?;
    metrics().system_messages.inc();
    Ok(message)
}

/// Display name of an agent, falling back to its id.
pub(crate) fn agent_name(conn: &Connection, agent_id: &str) -> Result<String> {
    Ok(agents::get_agent(conn, agent_id)?
        .map(|a| a.name)
        .unwrap_or_else(|| agent_id.to_string()))
}

/// Appends ". {label}: {text}" when `text` is present.
pub(crate) fn with_suffix(base: String, label: &str, text: Option<&str>) -> String {
    match text.map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => format!("{base}. {label}: {text}"),
        None => base,
    }
}

/// Moves `session` to `to`, writes it, and records the side effects: the
/// status-change SYSTEM message and, for terminal states, cancellation of a
/// pending transfer.
///
/// A same-status call writes nothing and returns no messages.
pub(crate) fn transition_session(
    conn: &Connection,
    session: &mut Session,
    to: SessionStatus,
    now: DateTime<Utc>,
) -> Result<Vec<Message>> {
    let Some(text) = session.transition(to, now)? else {
        return Ok(Vec::new());
    };
    record_status_change(conn, session, text, now)
}

/// Soft delete: closes the session whatever its status, then records the same
/// side effects as [`transition_session`].
pub(crate) fn force_close_session(
    conn: &Connection,
    session: &mut Session,
    now: DateTime<Utc>,
) -> Result<Vec<Message>> {
    let Some(text) = session.force_close(now) else {
        return Ok(Vec::new());
    };
    record_status_change(conn, session, text, now)
}

fn record_status_change(
    conn: &Connection,
    session: &mut Session,
    text: String,
    now: DateTime<Utc>,
) -> Result<Vec<Message>> {
    let to = session.status;
    sessions::update_session(conn, session)?;

    let mut log = vec![system_message(conn, session, text, now)?];
    if to.is_terminal() {
        log.extend(cancel_pending_transfer(conn, session, now)?);
        match to {
            SessionStatus::Closed => metrics().sessions_closed.inc(),
            SessionStatus::Abandoned => metrics().sessions_abandoned.inc(),
            _ => {}
        }
    }
    info!(session_id = %session.session_id, status = %to, "Session status changed");
    Ok(log)
}

/// Cancels the session's PENDING transfer, if any, because the session ended.
pub(crate) fn cancel_pending_transfer(
    conn: &Connection,
    session: &Session,
    now: DateTime<Utc>,
) -> Result<Option<Message>> {
    let Some(mut transfer) = transfers::pending_for_session(conn, &session.id)? else {
        return Ok(None);
    };
    transfer.resolve(
        TransferStatus::Cancelled,
        Some("Session ended".to_string()),
        now,
    )?;
    transfers::update_transfer(conn, &mut transfer)?;
    metrics().transfers_cancelled.inc();

    let to_name = agent_name(conn, &transfer.to_agent_id)?;
    let message = system_message(
        conn,
        session,
        format!("Pending transfer to {to_name} was cancelled because the session ended"),
        now,
    )?;
    info!(transfer_id = %transfer.id, session_id = %session.session_id, "Pending transfer cancelled");
    Ok(Some(message))
}
