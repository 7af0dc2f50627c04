//! Session queries.

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use support_core::error::ConflictErrorCode;
use support_core::{
    Error, PageRequest, Result, Session, SessionFilter, SessionStatus,
};

use super::{from_millis, json_col, opt_from_millis, opt_millis, parse_col, to_millis};
use crate::database::sql_err;

const SESSION_COLUMNS: &str = "id, session_id, visitor_name, visitor_email, visitor_phone, \
     user_id, customer_id, subject, department, source, priority, status, assigned_to, \
     rating, feedback, metadata, created_at, last_activity_at, assigned_at, ended_at, version";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    let metadata: Option<String> = row.get(15)?;
    Ok(Session {
        id: row.get(0)?,
        session_id: row.get(1)?,
        visitor_name: row.get(2)?,
        visitor_email: row.get(3)?,
        visitor_phone: row.get(4)?,
        user_id: row.get(5)?,
        customer_id: row.get(6)?,
        subject: row.get(7)?,
        department: row.get(8)?,
        source: row.get(9)?,
        priority: parse_col(10, row.get(10)?)?,
        status: parse_col(11, row.get(11)?)?,
        assigned_to: row.get(12)?,
        rating: row.get(13)?,
        feedback: row.get(14)?,
        metadata: metadata.map(|m| json_col(15, m)).transpose()?,
        created_at: from_millis(16, row.get(16)?)?,
        last_activity_at: from_millis(17, row.get(17)?)?,
        assigned_at: opt_from_millis(18, row.get(18)?)?,
        ended_at: opt_from_millis(19, row.get(19)?)?,
        version: row.get(20)?,
    })
}

/// Insert a new session row.
pub fn insert_session(conn: &Connection, session: &Session) -> Result<()> {
    let metadata = session
        .metadata
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.execute(
        &format!(
            "INSERT INTO support_sessions ({SESSION_COLUMNS}) VALUES \
             (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)"
        ),
        params![
            session.id,
            session.session_id,
            session.visitor_name,
            session.visitor_email,
            session.visitor_phone,
            session.user_id,
            session.customer_id,
            session.subject,
            session.department,
            session.source,
            session.priority.as_str(),
            session.status.as_str(),
            session.assigned_to,
            session.rating,
            session.feedback,
            metadata,
            to_millis(session.created_at),
            to_millis(session.last_activity_at),
            opt_millis(session.assigned_at),
            opt_millis(session.ended_at),
            session.version,
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

/// Get a session by row id or public session id.
pub fn get_session(conn: &Connection, id: &str) -> Result<Option<Session>> {
    conn.query_row(
        &format!("SELECT {SESSION_COLUMNS} FROM support_sessions WHERE id = ?1 OR session_id = ?1"),
        params![id],
        session_from_row,
    )
    .optional()
    .map_err(sql_err)
}

/// Get a session or fail with NOT_FOUND_001.
pub fn require_session(conn: &Connection, id: &str) -> Result<Session> {
    get_session(conn, id)?.ok_or_else(|| Error::session_not_found(id))
}

/// Write back every mutable column, conditional on the version the caller read.
///
/// On success the in-memory `version` is bumped to match the row.
pub fn update_session(conn: &Connection, session: &mut Session) -> Result<()> {
    let affected = conn
        .execute(
            "UPDATE support_sessions SET \
                subject = ?1, department = ?2, priority = ?3, status = ?4, assigned_to = ?5, \
                rating = ?6, feedback = ?7, last_activity_at = ?8, assigned_at = ?9, \
                ended_at = ?10, version = version + 1 \
             WHERE id = ?11 AND version = ?12",
            params![
                session.subject,
                session.department,
                session.priority.as_str(),
                session.status.as_str(),
                session.assigned_to,
                session.rating,
                session.feedback,
                to_millis(session.last_activity_at),
                opt_millis(session.assigned_at),
                opt_millis(session.ended_at),
                session.id,
                session.version,
            ],
        )
        .map_err(sql_err)?;

    if affected == 0 {
        return Err(Error::conflict(
            ConflictErrorCode::ConcurrentModification,
            format!("Session {} was modified concurrently", session.session_id),
        ));
    }
    session.version += 1;
    Ok(())
}

/// List sessions newest first, with the total matching count.
pub fn list_sessions(
    conn: &Connection,
    filter: &SessionFilter,
    page: PageRequest,
) -> Result<(Vec<Session>, u64)> {
    let mut clauses = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if let Some(status) = filter.status {
        values.push(status.as_str().to_string());
        clauses.push(format!("status = ?{}", values.len()));
    }
    if let Some(ref agent) = filter.assigned_to {
        values.push(agent.clone());
        clauses.push(format!("assigned_to = ?{}", values.len()));
    }
    if let Some(priority) = filter.priority {
        values.push(priority.as_str().to_string());
        clauses.push(format!("priority = ?{}", values.len()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let total: i64 = conn
        .query_row(
            &format!("SELECT COUNT(*) FROM support_sessions{where_sql}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )
        .map_err(sql_err)?;

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM support_sessions{where_sql} \
             ORDER BY created_at DESC, rowid DESC LIMIT {} OFFSET {}",
            page.limit,
            page.offset()
        ))
        .map_err(sql_err)?;
    let sessions = stmt
        .query_map(params_from_iter(values.iter()), session_from_row)
        .map_err(sql_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(sql_err)?;

    Ok((sessions, total as u64))
}

/// Number of WAITING sessions nobody owns yet.
pub fn count_unassigned_waiting(conn: &Connection) -> Result<u64> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM support_sessions WHERE status = 'WAITING' AND assigned_to IS NULL",
            [],
            |row| row.get(0),
        )
        .map_err(sql_err)?;
    Ok(count as u64)
}

/// Non-terminal sessions with no activity since `cutoff`, oldest first.
pub fn find_idle_sessions(
    conn: &Connection,
    cutoff: DateTime<Utc>,
    limit: u32,
) -> Result<Vec<Session>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM support_sessions \
             WHERE status IN (?1, ?2, ?3) AND last_activity_at < ?4 \
             ORDER BY last_activity_at ASC LIMIT ?5"
        ))
        .map_err(sql_err)?;
    let sessions = stmt
        .query_map(
            params![
                SessionStatus::Waiting.as_str(),
                SessionStatus::Active.as_str(),
                SessionStatus::Transferred.as_str(),
                to_millis(cutoff),
                limit,
            ],
            session_from_row,
        )
        .map_err(sql_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(sql_err)?;
    Ok(sessions)
}
