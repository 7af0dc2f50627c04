//! Unified error types for the support desk.
//!
//! Error codes:
//! - VALID_001-004: Validation errors
//! - NOT_FOUND_001-003: Unknown session, transfer or agent
//! - CONFLICT_001-004: State conflicts
//! - DB_001: Persistence errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Validation error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorCode {
    /// VALID_001: Malformed body or query string
    InvalidFormat,
    /// VALID_002: One or more fields failed validation
    InvalidField,
    /// VALID_003: Agent reference is unknown, inactive or not assignable
    InvalidAgent,
    /// VALID_004: Rating not accepted for this session
    RatingNotAccepted,
}

impl ValidationErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "VALID_001",
            Self::InvalidField => "VALID_002",
            Self::InvalidAgent => "VALID_003",
            Self::RatingNotAccepted => "VALID_004",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        400
    }
}

/// Not-found error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundErrorCode {
    /// NOT_FOUND_001: Unknown session id
    Session,
    /// NOT_FOUND_002: Unknown transfer id
    Transfer,
    /// NOT_FOUND_003: Unknown agent id
    Agent,
}

impl NotFoundErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Session => "NOT_FOUND_001",
            Self::Transfer => "NOT_FOUND_002",
            Self::Agent => "NOT_FOUND_003",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        404
    }
}

/// Conflict error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictErrorCode {
    /// CONFLICT_001: Session already has a pending transfer
    PendingTransferExists,
    /// CONFLICT_002: Status transition not allowed from the current state
    InvalidTransition,
    /// CONFLICT_003: Row changed underneath the caller
    ConcurrentModification,
    /// CONFLICT_004: Session is terminal and accepts no more messages
    SessionEnded,
}

impl ConflictErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::PendingTransferExists => "CONFLICT_001",
            Self::InvalidTransition => "CONFLICT_002",
            Self::ConcurrentModification => "CONFLICT_003",
            Self::SessionEnded => "CONFLICT_004",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::PendingTransferExists => 400,
            Self::InvalidTransition => 409,
            Self::ConcurrentModification => 409,
            Self::SessionEnded => 409,
        }
    }
}

/// Database error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorCode {
    /// DB_001: Query or transaction failed
    StoreFailed,
}

impl DbErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::StoreFailed => "DB_001",
        }
    }

    /// Get the HTTP status code.
    pub fn http_status(&self) -> u16 {
        500
    }
}

/// A single offending field in a validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Unified error type for the support desk.
#[derive(Debug, Error)]
pub enum Error {
    /// Validation error with code and per-field details.
    #[error("[{code}] {message}")]
    Validation {
        code: &'static str,
        message: String,
        fields: Vec<FieldError>,
    },

    /// Unknown entity.
    #[error("[{code}] {message}")]
    NotFound { code: &'static str, message: String },

    /// State conflict with code.
    #[error("[{code}] {message}")]
    Conflict {
        code: &'static str,
        message: String,
        http_status: u16,
    },

    /// Database error with code. The message is for logs only.
    #[error("[{code}] {message}")]
    Database { code: &'static str, message: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error with code.
    pub fn validation(code: ValidationErrorCode, msg: impl Into<String>) -> Self {
        Self::Validation {
            code: code.code(),
            message: msg.into(),
            fields: Vec::new(),
        }
    }

    /// Create a field-level validation error (VALID_002).
    pub fn invalid_fields(fields: Vec<FieldError>) -> Self {
        Self::Validation {
            code: ValidationErrorCode::InvalidField.code(),
            message: "Validation failed".to_string(),
            fields,
        }
    }

    /// Create a validation error naming a single field.
    pub fn invalid_field(
        code: ValidationErrorCode,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        let msg = msg.into();
        Self::Validation {
            code: code.code(),
            message: msg.clone(),
            fields: vec![FieldError::new(field, msg)],
        }
    }

    pub fn not_found(code: NotFoundErrorCode, msg: impl Into<String>) -> Self {
        Self::NotFound {
            code: code.code(),
            message: msg.into(),
        }
    }

    pub fn session_not_found(id: &str) -> Self {
        Self::not_found(NotFoundErrorCode::Session, format!("Session {id} not found"))
    }

    pub fn transfer_not_found(id: &str) -> Self {
        Self::not_found(NotFoundErrorCode::Transfer, format!("Transfer {id} not found"))
    }

    pub fn conflict(code: ConflictErrorCode, msg: impl Into<String>) -> Self {
        Self::Conflict {
            code: code.code(),
            message: msg.into(),
            http_status: code.http_status(),
        }
    }

    /// Create a database error.
    pub fn database(code: DbErrorCode, msg: impl Into<String>) -> Self {
        Self::Database {
            code: code.code(),
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the HTTP status code for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Conflict { http_status, .. } => *http_status,
            Self::Database { .. } => 500,
            Self::Serialization(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// Get the error code if this is a coded error.
    pub fn error_code(&self) -> Option<&'static str> {
        match self {
            Self::Validation { code, .. } => Some(code),
            Self::NotFound { code, .. } => Some(code),
            Self::Conflict { code, .. } => Some(code),
            Self::Database { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether this is a server-side failure whose detail must not reach the caller.
    pub fn is_internal(&self) -> bool {
        self.http_status() >= 500
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let field = camel_case(&field);
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("failed '{}' check", e.code));
                    FieldError::new(field.clone(), message)
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        Self::invalid_fields(fields)
    }
}

/// Field names on the wire are camelCase; validator reports Rust field names.
fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
