//! Row-level queries.
//!
//! Every function takes a plain `&Connection` so callers can compose several
//! of them inside one `Database::transaction`.

pub mod agents;
pub mod messages;
pub mod sessions;
pub mod settings;
pub mod transfers;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use std::str::FromStr;
use support_core::Error;

pub(crate) fn to_millis(ts: DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

pub(crate) fn opt_millis(ts: Option<DateTime<Utc>>) -> Option<i64> {
    ts.map(to_millis)
}

pub(crate) fn from_millis(idx: usize, ms: i64) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

pub(crate) fn opt_from_millis(idx: usize, ms: Option<i64>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    ms.map(|ms| from_millis(idx, ms)).transpose()
}

/// Parse an enum column stored as its wire string.
pub(crate) fn parse_col<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: FromStr<Err = Error>,
{
    value
        .parse()
        .map_err(|e: Error| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// Parse a JSON column.
pub(crate) fn json_col<T>(idx: usize, value: String) -> rusqlite::Result<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
