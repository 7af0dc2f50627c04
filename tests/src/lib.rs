//! Integration test harness for the support desk API.

pub mod fixtures;
pub mod mocks;
pub mod setup;
