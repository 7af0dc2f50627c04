//! Message log operations.

use support_core::error::{ConflictErrorCode, ValidationErrorCode};
use support_core::{
    now, Error, MarkRead, Message, MessageType, NewMessage, Result, SenderType,
};
use support_store::queries::{agents, messages, sessions};
use telemetry::metrics;
use tracing::debug;
use validator::Validate;

use crate::coordinator::Coordinator;
use crate::views::ReadReceipt;

impl Coordinator {
    /// Appends a visitor or agent message and refreshes the session's activity.
    pub async fn append_message(&self, id: &str, request: NewMessage) -> Result<Message> {
        request.validate()?;
        if request.sender_type == SenderType::System {
            return Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "senderType",
                "SYSTEM messages are reserved for the coordinator",
            ));
        }
        if request.message_type == MessageType::System {
            return Err(Error::invalid_field(
                ValidationErrorCode::InvalidField,
                "messageType",
                "SYSTEM messages are reserved for the coordinator",
            ));
        }
        if request.message_type.is_attachment() {
            self.get_config()
                .await?
                .check_attachment(request.mime_type.as_deref(), request.size_bytes)?;
        }

        let session_ref = id.to_string();
        let message = self
            .write("append_message", move |tx| {
                let at = now();
                let mut session = sessions::require_session(tx, &session_ref)?;
                if session.status.is_terminal() {
                    return Err(Error::conflict(
                        ConflictErrorCode::SessionEnded,
                        format!("Session {} has ended", session.session_id),
                    ));
                }

                if request.sender_type == SenderType::Agent {
                    let known = match request.sender_id.as_deref() {
                        Some(agent_id) => agents::get_agent(tx, agent_id)?.is_some(),
                        None => false,
                    };
                    if !known {
                        return Err(Error::invalid_field(
                            ValidationErrorCode::InvalidAgent,
                            "senderId",
                            "AGENT messages must name an existing agent",
                        ));
                    }
                }

                let mut message = Message::new(
                    &session.id,
                    request.content,
                    request.message_type,
                    request.sender_type,
                    request.sender_id,
                    at,
                );
                messages::insert_message(tx, &mut message)?;
                session.touch(at);
                sessions::update_session(tx, &mut session)?;
                Ok(message)
            })
            .await?;

        metrics().messages_appended.inc();
        debug!(message_id = %message.id, seq = message.seq, "Message appended");
        Ok(message)
    }

    /// Full history of a session, oldest first.
    pub async fn list_messages(&self, id: &str) -> Result<Vec<Message>> {
        let session_ref = id.to_string();
        self.read("list_messages", move |conn| {
            let session = sessions::require_session(conn, &session_ref)?;
            messages::list_messages(conn, &session.id)
        })
        .await
    }

    /// Marks every message from one sender type as READ.
    pub async fn mark_read(&self, id: &str, request: MarkRead) -> Result<ReadReceipt> {
        let session_ref = id.to_string();
        let updated = self
            .write("mark_read", move |tx| {
                let session = sessions::require_session(tx, &session_ref)?;
                messages::mark_read(tx, &session.id, request.sender_type)
            })
            .await?;
        Ok(ReadReceipt { updated })
    }
}
