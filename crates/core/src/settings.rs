//! Support configuration singleton.
//!
//! Exactly one row is expected to exist. It is materialized with the defaults
//! below on first read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result, ValidationErrorCode};

/// Welcome text used when no configuration has been customised.
pub const DEFAULT_WELCOME_MESSAGE: &str = "Hello! How can we help you today?";

/// Text shown while support is disabled.
pub const DEFAULT_OFFLINE_MESSAGE: &str =
    "We are currently offline. Leave a message and we will get back to you.";

pub const DEFAULT_MAX_SESSIONS_PER_AGENT: u32 = 5;
pub const DEFAULT_SESSION_TIMEOUT_MINUTES: u32 = 30;
pub const DEFAULT_MAX_FILE_SIZE_MB: u32 = 10;

fn default_allowed_file_types() -> Vec<String> {
    ["image/png", "image/jpeg", "image/gif", "application/pdf", "text/plain"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Process-wide support settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportConfig {
    pub enabled: bool,
    pub welcome_message: String,
    pub offline_message: String,
    pub auto_assignment: bool,
    pub max_sessions_per_agent: u32,
    pub allow_file_upload: bool,
    pub max_file_size_mb: u32,
    pub allowed_file_types: Vec<String>,
    pub allow_rating: bool,
    pub session_timeout_minutes: u32,
    pub updated_at: DateTime<Utc>,
}

impl SupportConfig {
    pub fn defaults(now: DateTime<Utc>) -> Self {
        Self {
            enabled: true,
            welcome_message: DEFAULT_WELCOME_MESSAGE.to_string(),
            offline_message: DEFAULT_OFFLINE_MESSAGE.to_string(),
            auto_assignment: true,
            max_sessions_per_agent: DEFAULT_MAX_SESSIONS_PER_AGENT,
            allow_file_upload: true,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            allowed_file_types: default_allowed_file_types(),
            allow_rating: true,
            session_timeout_minutes: DEFAULT_SESSION_TIMEOUT_MINUTES,
            updated_at: now,
        }
    }

    /// Text of the SYSTEM message that opens a new session.
    pub fn greeting(&self) -> &str {
        if self.enabled {
            &self.welcome_message
        } else {
            &self.offline_message
        }
    }

    /// Whether new sessions should go through the assignment policy.
    pub fn should_auto_assign(&self) -> bool {
        self.enabled && self.auto_assignment
    }

    /// Checks a declared attachment against the upload policy.
    ///
    /// MIME parameters (`; charset=...`) are ignored and the type compares
    /// case-insensitively. Both the type and the size must be declared.
    pub fn check_attachment(&self, mime_type: Option<&str>, size_bytes: Option<u64>) -> Result<()> {
        if !self.allow_file_upload {
            return Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "messageType",
                "File uploads are disabled",
            ));
        }

        let essence = mime_type
            .and_then(|m| m.split(';').next())
            .map(str::trim)
            .filter(|m| !m.is_empty());
        let Some(essence) = essence else {
            return Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "mimeType",
                "Attachments must declare a MIME type",
            ));
        };
        if !self
            .allowed_file_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(essence))
        {
            return Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "mimeType",
                format!("File type '{essence}' is not allowed"),
            ));
        }

        let limit = u64::from(self.max_file_size_mb) * 1024 * 1024;
        match size_bytes {
            None => Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "sizeBytes",
                "Attachments must declare their size",
            )),
            Some(size) if size > limit => Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "sizeBytes",
                format!("File exceeds the {} MB limit", self.max_file_size_mb),
            )),
            Some(_) => Ok(()),
        }
    }

    /// Applies an administrative update. Last writer wins.
    pub fn apply(&mut self, update: SupportConfigUpdate, now: DateTime<Utc>) {
        if let Some(v) = update.enabled {
            self.enabled = v;
        }
        if let Some(v) = update.welcome_message {
            self.welcome_message = v;
        }
        if let Some(v) = update.offline_message {
            self.offline_message = v;
        }
        if let Some(v) = update.auto_assignment {
            self.auto_assignment = v;
        }
        if let Some(v) = update.max_sessions_per_agent {
            self.max_sessions_per_agent = v;
        }
        if let Some(v) = update.allow_file_upload {
            self.allow_file_upload = v;
        }
        if let Some(v) = update.max_file_size_mb {
            self.max_file_size_mb = v;
        }
        if let Some(v) = update.allowed_file_types {
            self.allowed_file_types = v;
        }
        if let Some(v) = update.allow_rating {
            self.allow_rating = v;
        }
        if let Some(v) = update.session_timeout_minutes {
            self.session_timeout_minutes = v;
        }
        self.updated_at = now;
    }
}

/// Partial administrative update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SupportConfigUpdate {
    pub enabled: Option<bool>,
    #[validate(length(min = 1, max = 1000))]
    pub welcome_message: Option<String>,
    #[validate(length(min = 1, max = 1000))]
    pub offline_message: Option<String>,
    pub auto_assignment: Option<bool>,
    #[validate(range(min = 1, max = 100))]
    pub max_sessions_per_agent: Option<u32>,
    pub allow_file_upload: Option<bool>,
    #[validate(range(min = 1, max = 100))]
    pub max_file_size_mb: Option<u32>,
    #[validate(length(max = 32))]
    pub allowed_file_types: Option<Vec<String>>,
    pub allow_rating: Option<bool>,
    #[validate(range(min = 1, max = 10080))]
    pub session_timeout_minutes: Option<u32>,
}
