//! Message log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result, ValidationErrorCode};

/// Kind of message content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    #[default]
    Text,
    System,
    File,
    Image,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::System => "SYSTEM",
            Self::File => "FILE",
            Self::Image => "IMAGE",
        }
    }

    /// Whether this message carries an upload.
    pub fn is_attachment(&self) -> bool {
        matches!(self, Self::File | Self::Image)
    }
}

impl FromStr for MessageType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TEXT" => Ok(Self::Text),
            "SYSTEM" => Ok(Self::System),
            "FILE" => Ok(Self::File),
            "IMAGE" => Ok(Self::Image),
            other => Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "messageType",
                format!("unknown message type '{other}'"),
            )),
        }
    }
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SenderType {
    /// The visitor
    User,
    Agent,
    /// Synthesized by the coordinator
    System,
}

impl SenderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Agent => "AGENT",
            Self::System => "SYSTEM",
        }
    }
}

impl fmt::Display for SenderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SenderType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "USER" => Ok(Self::User),
            "AGENT" => Ok(Self::Agent),
            "SYSTEM" => Ok(Self::System),
            other => Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "senderType",
                format!("unknown sender type '{other}'"),
            )),
        }
    }
}

/// Delivery status. READ is the only mutation a message ever sees.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageStatus {
    #[default]
    Sent,
    Delivered,
    Read,
}

impl MessageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "SENT",
            Self::Delivered => "DELIVERED",
            Self::Read => "READ",
        }
    }
}

impl FromStr for MessageStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "SENT" => Ok(Self::Sent),
            "DELIVERED" => Ok(Self::Delivered),
            "READ" => Ok(Self::Read),
            other => Err(Error::internal(format!("unknown message status '{other}'"))),
        }
    }
}

/// A persisted message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    /// Position in the log, assigned by the store on insert
    pub seq: i64,
    /// Owning session row id
    pub session_id: String,
    pub content: String,
    pub message_type: MessageType,
    pub sender_type: SenderType,
    pub sender_id: Option<String>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Builds an unsaved message. `seq` is filled in by the store.
    pub fn new(
        session_id: impl Into<String>,
        content: impl Into<String>,
        message_type: MessageType,
        sender_type: SenderType,
        sender_id: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            seq: 0,
            session_id: session_id.into(),
            content: content.into(),
            message_type,
            sender_type,
            sender_id,
            status: MessageStatus::Sent,
            created_at: now,
        }
    }

    /// A coordinator-synthesized SYSTEM message.
    pub fn system(session_id: impl Into<String>, content: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::new(
            session_id,
            content,
            MessageType::System,
            SenderType::System,
            None,
            now,
        )
    }
}

/// Request to append a message from a visitor or an agent.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    #[validate(length(min = 1, max = 5000))]
    pub content: String,
    pub sender_type: SenderType,
    #[validate(length(max = 64))]
    pub sender_id: Option<String>,
    #[serde(default)]
    pub message_type: MessageType,
    /// Declared MIME type; required for FILE and IMAGE messages.
    #[serde(default)]
    #[validate(length(max = 255))]
    pub mime_type: Option<String>,
    /// Declared attachment size in bytes.
    #[serde(default)]
    pub size_bytes: Option<u64>,
}

impl NewMessage {
    /// A plain TEXT message.
    pub fn text(sender_type: SenderType, sender_id: Option<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sender_type,
            sender_id,
            message_type: MessageType::Text,
            mime_type: None,
            size_bytes: None,
        }
    }
}

/// Request to mark messages from one sender type as read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkRead {
    pub sender_type: SenderType,
}
