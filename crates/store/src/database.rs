//! SQLite connection handle.
//!
//! All statements run on tokio-rusqlite's single background thread, so each
//! `transaction` call is serialized against every other write. Do NOT open a
//! second connection for writes.

use rusqlite::{Connection, Transaction};
use support_core::error::DbErrorCode;
use support_core::{Error, Result};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::schema::{all_tables, SCHEMA_VERSION};

/// Map a rusqlite error into the coded database error.
pub fn sql_err(e: rusqlite::Error) -> Error {
    Error::database(DbErrorCode::StoreFailed, format!("SQLite error: {e}"))
}

/// Unwrap a tokio-rusqlite call error. Errors raised inside the closure pass
/// through untouched; connection-level failures become DB_001.
fn map_call_err(e: tokio_rusqlite::Error<Error>) -> Error {
    match e {
        tokio_rusqlite::Error::Error(inner) => inner,
        other => Error::database(
            DbErrorCode::StoreFailed,
            format!("SQLite connection error: {other}"),
        ),
    }
}

/// Handle to the support database.
#[derive(Clone)]
pub struct Database {
    conn: tokio_rusqlite::Connection,
    config: StoreConfig,
}

impl Database {
    /// Opens the database, applies pragmas and creates the schema.
    pub async fn open(config: StoreConfig) -> Result<Self> {
        let conn = if config.is_in_memory() {
            tokio_rusqlite::Connection::open_in_memory().await
        } else {
            if let Some(parent) = std::path::Path::new(&config.path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        Error::database(
                            DbErrorCode::StoreFailed,
                            format!("Failed to create {}: {e}", parent.display()),
                        )
                    })?;
                }
            }
            tokio_rusqlite::Connection::open(&config.path).await
        }
        .map_err(|e| {
            Error::database(
                DbErrorCode::StoreFailed,
                format!("Failed to open {}: {e}", config.path),
            )
        })?;

        let db = Self { conn, config };
        db.init().await?;

        info!(path = %db.config.path, "Opened support database");
        Ok(db)
    }

    /// Opens a private in-memory database.
    pub async fn open_in_memory() -> Result<Self> {
        Self::open(StoreConfig::in_memory()).await
    }

    async fn init(&self) -> Result<()> {
        let busy_timeout_ms = self.config.busy_timeout_ms;
        self.call(move |conn| {
            conn.execute_batch(&format!(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA foreign_keys = ON;
                 PRAGMA busy_timeout = {busy_timeout_ms};"
            ))
            .map_err(sql_err)?;

            for ddl in all_tables() {
                conn.execute_batch(ddl).map_err(sql_err)?;
            }
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .map_err(sql_err)?;
            Ok(())
        })
        .await?;

        debug!("Support schema initialized");
        Ok(())
    }

    /// Runs `f` against the connection outside of an explicit transaction.
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.conn
            .call(move |conn| f(conn))
            .await
            .map_err(map_call_err)
    }

    /// Runs `f` inside one transaction. Any error rolls back every write `f` made.
    pub async fn transaction<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Transaction<'_>) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        self.conn
            .call(move |conn| {
                let tx = conn.transaction().map_err(sql_err)?;
                let out = f(&tx)?;
                tx.commit().map_err(sql_err)?;
                Ok(out)
            })
            .await
            .map_err(map_call_err)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }
}
