//! Transfer requests and their state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ConflictErrorCode, Error, Result, ValidationErrorCode};

/// Transfer request status. Every state except PENDING is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransferStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "ACCEPTED" => Ok(Self::Accepted),
            "REJECTED" => Ok(Self::Rejected),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "status",
                format!("unknown transfer status '{other}'"),
            )),
        }
    }
}

/// A request to hand a session to another agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: String,
    /// Owning session row id
    pub session_id: String,
    /// `None` for a system-initiated or unassigned handoff
    pub from_agent_id: Option<String>,
    pub to_agent_id: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub status: TransferStatus,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub version: i64,
}

impl Transfer {
    pub fn new(
        session_id: impl Into<String>,
        from_agent_id: Option<String>,
        to_agent_id: impl Into<String>,
        reason: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            from_agent_id,
            to_agent_id: to_agent_id.into(),
            reason,
            notes: None,
            status: TransferStatus::Pending,
            created_at: now,
            accepted_at: None,
            rejected_at: None,
            cancelled_at: None,
            version: 0,
        }
    }

    /// Resolves a PENDING transfer into one of the terminal states.
    pub fn resolve(
        &mut self,
        to: TransferStatus,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        if self.status.is_terminal() {
            return Err(Error::conflict(
                ConflictErrorCode::InvalidTransition,
                format!("Transfer is already {}", self.status),
            ));
        }
        match to {
            TransferStatus::Pending => {
                return Err(Error::conflict(
                    ConflictErrorCode::InvalidTransition,
                    "Transfer is already PENDING",
                ))
            }
            TransferStatus::Accepted => self.accepted_at = Some(now),
            TransferStatus::Rejected => self.rejected_at = Some(now),
            TransferStatus::Cancelled => self.cancelled_at = Some(now),
        }
        self.status = to;
        if notes.is_some() {
            self.notes = notes;
        }
        Ok(())
    }
}

/// Request to open a transfer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewTransfer {
    #[validate(required(message = "sessionId is required"))]
    pub session_id: Option<String>,
    pub from_agent_id: Option<String>,
    #[validate(required(message = "toAgentId is required"))]
    pub to_agent_id: Option<String>,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

/// Request to resolve a transfer.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TransferUpdate {
    pub status: TransferStatus,
    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}
