//! Transfer queries.

use rusqlite::{params, params_from_iter, Connection, ErrorCode, OptionalExtension, Row};
use support_core::error::ConflictErrorCode;
use support_core::{Error, Result, Transfer, TransferFilter, TransferStatus};

use super::{from_millis, opt_from_millis, opt_millis, parse_col, to_millis};
use crate::database::sql_err;

const TRANSFER_COLUMNS: &str = "id, session_id, from_agent_id, to_agent_id, reason, notes, \
     status, created_at, accepted_at, rejected_at, cancelled_at, version";

fn transfer_from_row(row: &Row<'_>) -> rusqlite::Result<Transfer> {
    Ok(Transfer {
        id: row.get(0)?,
        session_id: row.get(1)?,
        from_agent_id: row.get(2)?,
        to_agent_id: row.get(3)?,
        reason: row.get(4)?,
        notes: row.get(5)?,
        status: parse_col(6, row.get(6)?)?,
        created_at: from_millis(7, row.get(7)?)?,
        accepted_at: opt_from_millis(8, row.get(8)?)?,
        rejected_at: opt_from_millis(9, row.get(9)?)?,
        cancelled_at: opt_from_millis(10, row.get(10)?)?,
        version: row.get(11)?,
    })
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == ErrorCode::ConstraintViolation
                && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Insert a transfer. A second PENDING transfer for the same session fails
/// with CONFLICT_001.
pub fn insert_transfer(conn: &Connection, transfer: &Transfer) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO support_transfers ({TRANSFER_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
        ),
        params![
            transfer.id,
            transfer.session_id,
            transfer.from_agent_id,
            transfer.to_agent_id,
            transfer.reason,
            transfer.notes,
            transfer.status.as_str(),
            to_millis(transfer.created_at),
            opt_millis(transfer.accepted_at),
            opt_millis(transfer.rejected_at),
            opt_millis(transfer.cancelled_at),
            transfer.version,
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            Error::conflict(
                ConflictErrorCode::PendingTransferExists,
                "A pending transfer already exists for this session",
            )
        } else {
            sql_err(e)
        }
    })?;
    Ok(())
}

pub fn get_transfer(conn: &Connection, id: &str) -> Result<Option<Transfer>> {
    conn.query_row(
        &format!("SELECT {TRANSFER_COLUMNS} FROM support_transfers WHERE id = ?1"),
        params![id],
        transfer_from_row,
    )
    .optional()
    .map_err(sql_err)
}

/// Get a transfer or fail with NOT_FOUND_002.
pub fn require_transfer(conn: &Connection, id: &str) -> Result<Transfer> {
    get_transfer(conn, id)?.ok_or_else(|| Error::transfer_not_found(id))
}

/// The PENDING transfer of a session, if one exists.
pub fn pending_for_session(conn: &Connection, session_id: &str) -> Result<Option<Transfer>> {
    conn.query_row(
        &format!(
            "SELECT {TRANSFER_COLUMNS} FROM support_transfers \
             WHERE session_id = ?1 AND status = ?2"
        ),
        params![session_id, TransferStatus::Pending.as_str()],
        transfer_from_row,
    )
    .optional()
    .map_err(sql_err)
}

/// Persist a resolution, conditional on the version the caller read.
pub fn update_transfer(conn: &Connection, transfer: &mut Transfer) -> Result<()> {
    let affected = conn
        .execute(
            "UPDATE support_transfers SET \
                status = ?1, notes = ?2, accepted_at = ?3, rejected_at = ?4, \
                cancelled_at = ?5, version = version + 1 \
             WHERE id = ?6 AND version = ?7",
            params![
                transfer.status.as_str(),
                transfer.notes,
                opt_millis(transfer.accepted_at),
                opt_millis(transfer.rejected_at),
                opt_millis(transfer.cancelled_at),
                transfer.id,
                transfer.version,
            ],
        )
        .map_err(sql_err)?;

    if affected == 0 {
        return Err(Error::conflict(
            ConflictErrorCode::ConcurrentModification,
            format!("Transfer {} was modified concurrently", transfer.id),
        ));
    }
    transfer.version += 1;
    Ok(())
}

/// List transfers newest first.
pub fn list_transfers(conn: &Connection, filter: &TransferFilter) -> Result<Vec<Transfer>> {
    let mut clauses = Vec::new();
    let mut values: Vec<String> = Vec::new();

    if let Some(ref session_id) = filter.session_id {
        values.push(session_id.clone());
        clauses.push(format!("session_id = ?{}", values.len()));
    }
    if let Some(status) = filter.status {
        values.push(status.as_str().to_string());
        clauses.push(format!("status = ?{}", values.len()));
    }

    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    };

    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TRANSFER_COLUMNS} FROM support_transfers{where_sql} \
             ORDER BY created_at DESC, rowid DESC"
        ))
        .map_err(sql_err)?;
    let transfers = stmt
        .query_map(params_from_iter(values.iter()), transfer_from_row)
        .map_err(sql_err)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(sql_err)?;
    Ok(transfers)
}
