//! Transfer workflow: request, accept, reject, cancel.

use support_core::error::{ConflictErrorCode, ValidationErrorCode};
use support_core::{
    now, Agent, Error, NewTransfer, Result, SessionStatus, Transfer, TransferFilter,
    TransferStatus, TransferUpdate,
};
use support_store::queries::{agents, sessions, transfers};
use telemetry::metrics;
use tracing::info;
use validator::Validate;

use crate::coordinator::Coordinator;
use crate::notify::Notification;
use crate::ops::{agent_name, system_message, with_suffix};

impl Coordinator {
    /// Opens a PENDING transfer and records the request in the session log.
    pub async fn create_transfer(&self, request: NewTransfer) -> Result<Transfer> {
        request.validate()?;
        let (Some(session_ref), Some(to_agent_id)) =
            (request.session_id.clone(), request.to_agent_id.clone())
        else {
            return Err(Error::validation(
                ValidationErrorCode::InvalidField,
                "sessionId and toAgentId are required",
            ));
        };
        let from_agent_id = request.from_agent_id.clone();
        let reason = request.reason.clone();

        let (transfer, public_id) = self
            .write("create_transfer", move |tx| {
                let at = now();
                let mut session = sessions::require_session(tx, &session_ref)?;
                if session.status.is_terminal() {
                    return Err(Error::conflict(
                        ConflictErrorCode::SessionEnded,
                        format!("Session {} has ended", session.session_id),
                    ));
                }

                let to_agent =
                    Agent::require_assignable(agents::get_agent(tx, &to_agent_id)?, "toAgentId")?;
                let from_name = match from_agent_id.as_deref() {
                    Some(id) => match agents::get_agent(tx, id)? {
                        Some(agent) => agent.name,
                        None => {
                            return Err(Error::invalid_field(
                                ValidationErrorCode::InvalidAgent,
                                "fromAgentId",
                                "Agent not found",
                            ))
                        }
                    },
                    None => "System".to_string(),
                };
                if from_agent_id.as_deref() == Some(to_agent.id.as_str()) {
                    return Err(Error::invalid_field(
                        ValidationErrorCode::InvalidAgent,
                        "toAgentId",
                        "Cannot transfer a session to the same agent",
                    ));
                }

                if transfers::pending_for_session(tx, &session.id)?.is_some() {
                    return Err(Error::conflict(
                        ConflictErrorCode::PendingTransferExists,
                        "A pending transfer already exists for this session",
                    ));
                }

                let transfer =
                    Transfer::new(&session.id, from_agent_id, &to_agent.id, reason, at);
                transfers::insert_transfer(tx, &transfer)?;

                let text = with_suffix(
                    format!("Transfer requested from {from_name} to {}", to_agent.name),
                    "Reason",
                    transfer.reason.as_deref(),
                );
                system_message(tx, &session, text, at)?;
                session.touch(at);
                sessions::update_session(tx, &mut session)?;
                Ok((transfer, session.session_id))
            })
            .await?;

        metrics().transfers_requested.inc();
        info!(
            transfer_id = %transfer.id,
            session_id = %public_id,
            to_agent_id = %transfer.to_agent_id,
            "Transfer requested"
        );
        self.dispatch(Notification::TransferRequested {
            transfer_id: transfer.id.clone(),
            session_id: public_id,
            from_agent_id: transfer.from_agent_id.clone(),
            to_agent_id: transfer.to_agent_id.clone(),
            reason: transfer.reason.clone(),
        });
        Ok(transfer)
    }

    pub async fn get_transfer(&self, id: &str) -> Result<Transfer> {
        let transfer_id = id.to_string();
        self.read("get_transfer", move |conn| {
            transfers::require_transfer(conn, &transfer_id)
        })
        .await
    }

    /// Lists transfers newest first. `session_id` may be either session id.
    pub async fn list_transfers(&self, filter: TransferFilter) -> Result<Vec<Transfer>> {
        self.read("list_transfers", move |conn| {
            let mut filter = filter;
            if let Some(ref session_ref) = filter.session_id {
                if let Some(session) = sessions::get_session(conn, session_ref)? {
                    filter.session_id = Some(session.id);
                }
            }
            transfers::list_transfers(conn, &filter)
        })
        .await
    }

    /// Resolves a PENDING transfer. Accepting reassigns and reactivates the
    /// session in the same transaction.
    pub async fn update_transfer(&self, id: &str, update: TransferUpdate) -> Result<Transfer> {
        update.validate()?;
        let transfer_id = id.to_string();

        let transfer = self
            .write("update_transfer", move |tx| {
                let at = now();
                let mut transfer = transfers::require_transfer(tx, &transfer_id)?;
                let mut session = sessions::require_session(tx, &transfer.session_id)?;
                transfer.resolve(update.status, update.notes, at)?;

                let to_name = agent_name(tx, &transfer.to_agent_id)?;
                let text = match transfer.status {
                    TransferStatus::Accepted => {
                        if session.status.is_terminal() {
                            return Err(Error::conflict(
                                ConflictErrorCode::InvalidTransition,
                                format!("Session {} has ended", session.session_id),
                            ));
                        }
                        let agent = Agent::require_assignable(
                            agents::get_agent(tx, &transfer.to_agent_id)?,
                            "toAgentId",
                        )?;
                        session.assign(&agent.id, at);
                        session.transition(SessionStatus::Active, at)?;
                        format!("Session transferred to {}", agent.name)
                    }
                    TransferStatus::Rejected => with_suffix(
                        format!("{to_name} rejected the transfer"),
                        "Notes",
                        transfer.notes.as_deref(),
                    ),
                    TransferStatus::Cancelled => with_suffix(
                        format!("Transfer to {to_name} was cancelled"),
                        "Notes",
                        transfer.notes.as_deref(),
                    ),
                    TransferStatus::Pending => {
                        return Err(Error::internal("resolved transfer is still PENDING"))
                    }
                };

                transfers::update_transfer(tx, &mut transfer)?;
                session.touch(at);
                sessions::update_session(tx, &mut session)?;
                system_message(tx, &session, text, at)?;
                Ok(transfer)
            })
            .await?;

        match transfer.status {
            TransferStatus::Accepted => metrics().transfers_accepted.inc(),
            TransferStatus::Rejected => metrics().transfers_rejected.inc(),
            TransferStatus::Cancelled => metrics().transfers_cancelled.inc(),
            TransferStatus::Pending => {}
        }
        info!(transfer_id = %transfer.id, status = %transfer.status, "Transfer resolved");
        Ok(transfer)
    }
}
