//! Admin token check for agent-facing routes.

use tracing::warn;

use crate::response::ApiError;

/// Checks an `Authorization` header value against the configured token.
///
/// With no token configured every request passes.
pub fn authorize(expected: Option<&str>, header: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let presented = header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim);

    match presented {
        Some(token) if constant_time_eq(token.as_bytes(), expected.as_bytes()) => Ok(()),
        Some(_) => {
            warn!("Rejected request with invalid admin token");
            Err(ApiError::unauthorized("Invalid admin token"))
        }
        None => Err(ApiError::unauthorized("Missing admin token")),
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
