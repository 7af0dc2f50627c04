//! Store liveness probe.

use std::time::Instant;

use support_core::Result;

use crate::database::{sql_err, Database};

/// Round-trips a trivial query and returns the latency in milliseconds.
pub async fn check_connection(db: &Database) -> Result<u64> {
    let started = Instant::now();
    db.call(|conn| {
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(sql_err)
    })
    .await?;
    Ok(started.elapsed().as_millis() as u64)
}
