//! SQLite persistence for support sessions, messages, transfers, agents and
//! the configuration singleton.

pub mod config;
pub mod database;
pub mod health;
pub mod queries;
pub mod schema;

pub use config::StoreConfig;
pub use database::{sql_err, Database};
pub use health::check_connection;
