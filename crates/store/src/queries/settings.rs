//! Support configuration singleton.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use support_core::{Result, SupportConfig};

use super::{from_millis, json_col, to_millis};
use crate::database::sql_err;

const SETTINGS_COLUMNS: &str = "enabled, welcome_message, offline_message, auto_assignment, \
     max_sessions_per_agent, allow_file_upload, max_file_size_mb, allowed_file_types, \
     allow_rating, session_timeout_minutes, updated_at";

fn settings_from_row(row: &Row<'_>) -> rusqlite::Result<SupportConfig> {
    Ok(SupportConfig {
        enabled: row.get(0)?,
        welcome_message: row.get(1)?,
        offline_message: row.get(2)?,
        auto_assignment: row.get(3)?,
        max_sessions_per_agent: row.get(4)?,
        allow_file_upload: row.get(5)?,
        max_file_size_mb: row.get(6)?,
        allowed_file_types: json_col(7, row.get(7)?)?,
        allow_rating: row.get(8)?,
        session_timeout_minutes: row.get(9)?,
        updated_at: from_millis(10, row.get(10)?)?,
    })
}

fn write_settings(conn: &Connection, config: &SupportConfig, on_conflict: &str) -> Result<()> {
    let file_types = serde_json::to_string(&config.allowed_file_types)?;
    conn.execute(
        &format!(
            "INSERT INTO support_settings (id, {SETTINGS_COLUMNS}) \
             VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) {on_conflict}"
        ),
        params![
            config.enabled,
            config.welcome_message,
            config.offline_message,
            config.auto_assignment,
            config.max_sessions_per_agent,
            config.allow_file_upload,
            config.max_file_size_mb,
            file_types,
            config.allow_rating,
            config.session_timeout_minutes,
            to_millis(config.updated_at),
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

pub fn get_settings(conn: &Connection) -> Result<Option<SupportConfig>> {
    conn.query_row(
        &format!("SELECT {SETTINGS_COLUMNS} FROM support_settings WHERE id = 1"),
        [],
        settings_from_row,
    )
    .optional()
    .map_err(sql_err)
}

/// Read the singleton, materializing the defaults if it does not exist yet.
///
/// Concurrent first reads converge on one row: the insert is a no-op for
/// everyone but the first writer.
pub fn get_or_create_settings(conn: &Connection, now: DateTime<Utc>) -> Result<SupportConfig> {
    write_settings(conn, &SupportConfig::defaults(now), "ON CONFLICT(id) DO NOTHING")?;
    match get_settings(conn)? {
        Some(config) => Ok(config),
        None => Err(support_core::Error::internal("support settings row missing after insert")),
    }
}

/// Replace the singleton.
pub fn save_settings(conn: &Connection, config: &SupportConfig) -> Result<()> {
    write_settings(
        conn,
        config,
        "ON CONFLICT(id) DO UPDATE SET \
            enabled = excluded.enabled, \
            welcome_message = excluded.welcome_message, \
            offline_message = excluded.offline_message, \
            auto_assignment = excluded.auto_assignment, \
            max_sessions_per_agent = excluded.max_sessions_per_agent, \
            allow_file_upload = excluded.allow_file_upload, \
            max_file_size_mb = excluded.max_file_size_mb, \
            allowed_file_types = excluded.allowed_file_types, \
            allow_rating = excluded.allow_rating, \
            session_timeout_minutes = excluded.session_timeout_minutes, \
            updated_at = excluded.updated_at",
    )
}
