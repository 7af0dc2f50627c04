//! Message log queries.

use rusqlite::{params, Connection, OptionalExtension, Row};
use support_core::{Message, MessageStatus, Result, SenderType};

use super::{from_millis, parse_col, to_millis};
use crate::database::sql_err;

const MESSAGE_COLUMNS: &str =
    "seq, id, session_id, content, message_type, sender_type, sender_id, status, created_at";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        seq: row.get(0)?,
        id: row.get(1)?,
        session_id: row.get(2)?,
        content: row.get(3)?,
        message_type: parse_col(4, row.get(4)?)?,
        sender_type: parse_col(5, row.get(5)?)?,
        sender_id: row.get(6)?,
        status: parse_col(7, row.get(7)?)?,
        created_at: from_millis(8, row.get(8)?)?,
    })
}

/// Append a message and record the log position it was given.
pub fn insert_message(conn: &Connection, message: &mut Message) -> Result<()> {
    conn.execute(
        "INSERT INTO support_messages \
            (id, session_id, content, message_type, sender_type, sender_id, status, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            message.id,
            message.session_id,
            message.content,
            message.message_type.as_str(),
            message.sender_type.as_str(),
            message.sender_id,
            message.status.as_str(),
            to_millis(message.created_at),
        ],
    )
    .map_err(sql_err)?;
    message.seq = conn.last_insert_rowid();
    Ok(())
}

/// Full log of a session in chronological order.
pub fn list_messages(conn: &Connection, session_id: &str) -> Result<Vec<Message>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM support_messages \
             WHERE session_id = ?1 ORDER BY created_at ASC, seq ASC"
        ))
        .map_err(sql_err)?;
    let messages = stmt
        .query_map(params![session_id], message_from_row)
        .map_err(sql_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(sql_err)?;
    Ok(messages)
}

/// Most recent message of a session, if any.
pub fn latest_message(conn: &Connection, session_id: &str) -> Result<Option<Message>> {
    conn.query_row(
        &format!(
            "SELECT {MESSAGE_COLUMNS} FROM support_messages \
             WHERE session_id = ?1 ORDER BY created_at DESC, seq DESC LIMIT 1"
        ),
        params![session_id],
        message_from_row,
    )
    .optional()
    .map_err(sql_err)
}

/// Messages from `sender` that have not reached READ.
pub fn count_unread(conn: &Connection, session_id: &str, sender: SenderType) -> Result<u64> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM support_messages \
             WHERE session_id = ?1 AND sender_type = ?2 AND status != ?3",
            params![session_id, sender.as_str(), MessageStatus::Read.as_str()],
            |row| row.get(0),
        )
        .map_err(sql_err)?;
    Ok(count as u64)
}

/// Mark every unread message from `sender` as READ. Returns how many changed.
pub fn mark_read(conn: &Connection, session_id: &str, sender: SenderType) -> Result<usize> {
    conn.execute(
        "UPDATE support_messages SET status = ?1 \
         WHERE session_id = ?2 AND sender_type = ?3 AND status != ?1",
        params![MessageStatus::Read.as_str(), session_id, sender.as_str()],
    )
    .map_err(sql_err)
}
