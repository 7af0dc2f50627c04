//! Response shapes returned by coordinator operations.

use serde::{Deserialize, Serialize};
use support_core::{Message, Pagination, Session, Transfer};

/// A session with its full message log and transfer history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetail {
    #[serde(flatten)]
    pub session: Session,
    /// Ascending log order
    pub messages: Vec<Message>,
    /// Oldest first
    pub transfers: Vec<Transfer>,
}

/// One row of a session listing. The preview fields are only filled in the
/// admin view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionListItem {
    #[serde(flatten)]
    pub session: Session,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<Message>,
    /// Visitor messages not yet marked READ
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPage {
    pub sessions: Vec<SessionListItem>,
    pub pagination: Pagination,
}

/// Outcome of marking messages read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadReceipt {
    pub updated: usize,
}
