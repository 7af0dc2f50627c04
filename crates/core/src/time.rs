//! Clock helpers.

use chrono::{DateTime, SubsecRound, Utc};

/// Current time truncated to milliseconds, the precision the store keeps.
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}
