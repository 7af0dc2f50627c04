//! Core types, state machines, and validation for the support desk.

pub mod agent;
pub mod error;
pub mod limits;
pub mod message;
pub mod query;
pub mod session;
pub mod settings;
pub mod time;
pub mod transfer;

pub use agent::*;
pub use error::{Error, FieldError, Result};
pub use message::*;
pub use query::*;
pub use session::*;
pub use settings::*;
pub use time::now;
pub use transfer::*;
