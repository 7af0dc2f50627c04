//! Support session types and the session status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::{ConflictErrorCode, Error, Result, ValidationErrorCode};

/// Maximum serialized metadata size in bytes (8KB).
const MAX_METADATA_BYTES: usize = 8 * 1024;

/// Session priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Normal => "NORMAL",
            Self::High => "HIGH",
            Self::Urgent => "URGENT",
        }
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "LOW" => Ok(Self::Low),
            "NORMAL" => Ok(Self::Normal),
            "HIGH" => Ok(Self::High),
            "URGENT" => Ok(Self::Urgent),
            other => Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "priority",
                format!("unknown priority '{other}'"),
            )),
        }
    }
}

/// Session lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Waiting,
    Active,
    Transferred,
    Closed,
    Abandoned,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::Active => "ACTIVE",
            Self::Transferred => "TRANSFERRED",
            Self::Closed => "CLOSED",
            Self::Abandoned => "ABANDONED",
        }
    }

    /// CLOSED and ABANDONED accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Closed | Self::Abandoned)
    }

    /// Statuses that count toward an agent's load.
    pub fn counts_toward_load(&self) -> bool {
        matches!(self, Self::Waiting | Self::Active)
    }

    /// Whether a move from `self` to `next` is legal. Same-status moves are
    /// handled by the caller as no-ops and are not legal transitions.
    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        match (self, next) {
            (Waiting, Active | Transferred | Closed | Abandoned) => true,
            (Active, Waiting | Transferred | Closed | Abandoned) => true,
            (Transferred, Waiting | Active | Closed | Abandoned) => true,
            _ => false,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "WAITING" => Ok(Self::Waiting),
            "ACTIVE" => Ok(Self::Active),
            "TRANSFERRED" => Ok(Self::Transferred),
            "CLOSED" => Ok(Self::Closed),
            "ABANDONED" => Ok(Self::Abandoned),
            other => Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "status",
                format!("unknown session status '{other}'"),
            )),
        }
    }
}

/// A visitor-to-support conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Row id
    pub id: String,
    /// Public session identifier handed to the visitor
    pub session_id: String,
    pub visitor_name: Option<String>,
    pub visitor_email: Option<String>,
    pub visitor_phone: Option<String>,
    /// Linked registered user
    pub user_id: Option<String>,
    /// Linked CRM customer record
    pub customer_id: Option<String>,
    pub subject: Option<String>,
    pub department: Option<String>,
    pub source: Option<String>,
    pub priority: Priority,
    pub status: SessionStatus,
    pub assigned_to: Option<String>,
    pub rating: Option<u8>,
    pub feedback: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    /// Optimistic concurrency counter, bumped on every write
    pub version: i64,
}

impl Session {
    /// Creates a WAITING, unassigned session from a visitor request.
    pub fn new(request: NewSession, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: generate_session_id(),
            visitor_name: request.visitor_name,
            visitor_email: request.visitor_email,
            visitor_phone: request.visitor_phone,
            user_id: request.user_id,
            customer_id: request.customer_id,
            subject: request.subject,
            department: request.department,
            source: request.source,
            priority: request.priority.unwrap_or_default(),
            status: SessionStatus::Waiting,
            assigned_to: None,
            rating: None,
            feedback: None,
            metadata: request.metadata,
            created_at: now,
            last_activity_at: now,
            assigned_at: None,
            ended_at: None,
            version: 0,
        }
    }

    /// Moves the session to `to`.
    ///
    /// Returns the SYSTEM message describing the change, or `None` when the
    /// session is already in `to`. Entering a terminal status sets `ended_at`.
    pub fn transition(&mut self, to: SessionStatus, now: DateTime<Utc>) -> Result<Option<String>> {
        if self.status == to {
            return Ok(None);
        }
        if !self.status.can_transition_to(to) {
            return Err(Error::conflict(
                ConflictErrorCode::InvalidTransition,
                format!("Session cannot move from {} to {}", self.status, to),
            ));
        }

        let from = self.status;
        self.status = to;
        self.last_activity_at = now;
        if to.is_terminal() && self.ended_at.is_none() {
            self.ended_at = Some(now);
        }

        let text = match to {
            SessionStatus::Closed => "Session has been closed".to_string(),
            SessionStatus::Abandoned => {
                "Session was marked as abandoned after a period of inactivity".to_string()
            }
            _ => format!("Session status changed from {from} to {to}"),
        };
        Ok(Some(text))
    }

    /// Soft delete. Forces CLOSED from any status, ABANDONED included, and
    /// keeps an existing `ended_at`. Returns `None` when already closed.
    pub fn force_close(&mut self, now: DateTime<Utc>) -> Option<String> {
        if self.status == SessionStatus::Closed {
            return None;
        }
        self.status = SessionStatus::Closed;
        self.last_activity_at = now;
        self.ended_at.get_or_insert(now);
        Some("Session has been closed".to_string())
    }

    /// Points the session at `agent_id`. Returns whether the assignee changed.
    pub fn assign(&mut self, agent_id: &str, now: DateTime<Utc>) -> bool {
        if self.assigned_to.as_deref() == Some(agent_id) {
            return false;
        }
        self.assigned_to = Some(agent_id.to_string());
        self.assigned_at = Some(now);
        self.last_activity_at = now;
        true
    }

    /// Clears the assignee.
    pub fn unassign(&mut self) -> bool {
        if self.assigned_to.is_none() {
            return false;
        }
        self.assigned_to = None;
        self.assigned_at = None;
        true
    }

    /// Records a visitor rating. Only closed sessions can be rated.
    pub fn rate(&mut self, rating: Option<u8>, feedback: Option<String>, allowed: bool) -> Result<()> {
        if rating.is_none() && feedback.is_none() {
            return Ok(());
        }
        if !allowed {
            return Err(Error::invalid_field(
                ValidationErrorCode::RatingNotAccepted,
                "rating",
                "Ratings are disabled",
            ));
        }
        if self.status != SessionStatus::Closed {
            return Err(Error::invalid_field(
                ValidationErrorCode::RatingNotAccepted,
                "rating",
                "Only closed sessions can be rated",
            ));
        }
        if rating.is_some() {
            self.rating = rating;
        }
        if feedback.is_some() {
            self.feedback = feedback;
        }
        Ok(())
    }

    /// Marks visitor or agent activity.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    /// Checks the timestamp invariants that every persisted row must hold.
    pub fn invariants_hold(&self) -> bool {
        let closed_ok = !self.status.is_terminal() || self.ended_at.is_some();
        let assigned_ok = self.assigned_to.is_none() || self.assigned_at.is_some();
        closed_ok && assigned_ok
    }
}

/// Generates the public session identifier.
pub fn generate_session_id() -> String {
    format!("sess_{}", Uuid::new_v4().simple())
}

/// Validates free-form metadata: must be a JSON object within the size limit.
fn validate_metadata(metadata: &serde_json::Value) -> std::result::Result<(), ValidationError> {
    if !metadata.is_object() {
        let mut err = ValidationError::new("metadata_not_object");
        err.message = Some("metadata must be a JSON object".into());
        return Err(err);
    }

    let size = serde_json::to_vec(metadata).map(|v| v.len()).unwrap_or(0);
    if size > MAX_METADATA_BYTES {
        let mut err = ValidationError::new("metadata_too_large");
        err.message = Some(
            format!(
                "metadata {}KB exceeds {}KB limit",
                size / 1024,
                MAX_METADATA_BYTES / 1024
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// Visitor request to open a session. No field is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    #[validate(length(max = 120))]
    pub visitor_name: Option<String>,
    #[validate(email, length(max = 254))]
    pub visitor_email: Option<String>,
    #[validate(length(max = 32))]
    pub visitor_phone: Option<String>,
    #[validate(length(max = 64))]
    pub user_id: Option<String>,
    #[validate(length(max = 64))]
    pub customer_id: Option<String>,
    #[validate(length(max = 200))]
    pub subject: Option<String>,
    #[validate(length(max = 64))]
    pub department: Option<String>,
    #[validate(length(max = 64))]
    pub source: Option<String>,
    pub priority: Option<Priority>,
    #[validate(custom(function = "validate_metadata"))]
    pub metadata: Option<serde_json::Value>,
}

/// Partial update of a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub status: Option<SessionStatus>,
    pub priority: Option<Priority>,
    /// Absent: unchanged. `null`: unassign. String: assign to that agent.
    #[serde(default, deserialize_with = "deserialize_some")]
    pub assigned_to: Option<Option<String>>,
    #[validate(length(max = 200))]
    pub subject: Option<String>,
    #[validate(length(max = 64))]
    pub department: Option<String>,
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<u8>,
    #[validate(length(max = 2000))]
    pub feedback: Option<String>,
    /// When set, the update only applies if the row is still at this version.
    pub expected_version: Option<i64>,
}

impl SessionUpdate {
    /// Update that only changes status.
    pub fn status(status: SessionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }
}

/// Distinguishes an explicit `null` from an absent field.
fn deserialize_some<'de, T, D>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}
