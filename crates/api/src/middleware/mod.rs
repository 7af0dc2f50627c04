//! Request middleware.

pub mod auth;
pub mod latency;
pub mod rate_limit;
