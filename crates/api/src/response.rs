//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use support_core::FieldError;
use telemetry::metrics;
use tracing::error;

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub database_connected: bool,
    pub notifier_healthy: bool,
    pub waiting_backlog: u64,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Vec<FieldError>) -> Self {
        if !details.is_empty() {
            self.details = Some(details);
        }
        self
    }
}

/// API error type with stable error codes.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
    pub retry_after: Option<u64>,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
            retry_after: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_001", msg)
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::UNAUTHORIZED, "AUTH_001", msg)
    }

    pub fn rate_limited(msg: impl Into<String>, retry_after: Option<u64>) -> Self {
        metrics().rate_limited_requests.inc();
        Self {
            status: StatusCode::TOO_MANY_REQUESTS,
            response: ErrorResponse::new(msg, "RATE_001"),
            retry_after,
        }
    }

    /// Generic 500; the cause stays in the server log.
    pub fn internal() -> Self {
        Self::with_code(
            StatusCode::INTERNAL_SERVER_ERROR,
            "DB_001",
            "Internal server error",
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.response)).into_response();

        // Add Retry-After header for rate limit responses
        if let Some(retry_after) = self.retry_after {
            if let Ok(value) = retry_after.to_string().parse() {
                response.headers_mut().insert("Retry-After", value);
            }
        }

        response
    }
}

impl From<support_core::Error> for ApiError {
    fn from(err: support_core::Error) -> Self {
        use support_core::Error;

        if err.is_internal() {
            error!(error = %err, "Request failed");
            return ApiError::internal();
        }

        let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::BAD_REQUEST);
        match err {
            Error::Validation {
                code,
                message,
                fields,
            } => ApiError {
                status,
                response: ErrorResponse::new(message, code).with_details(fields),
                retry_after: None,
            },
            Error::NotFound { code, message } | Error::Conflict { code, message, .. } => {
                ApiError::with_code(status, code, message)
            }
            Error::Serialization(e) => ApiError::bad_request(e.to_string()),
            other => ApiError::with_code(status, "VALID_001", other.to_string()),
        }
    }
}
