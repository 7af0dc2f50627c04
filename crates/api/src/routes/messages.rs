//! Message log endpoints.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use coordinator::ReadReceipt;
use support_core::{MarkRead, Message, NewMessage, SenderType};

use crate::extractors::{AdminAuth, JsonBody};
use crate::middleware::auth::authorize;
use crate::response::ApiError;
use crate::state::AppState;

/// GET /support/sessions/:id/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>, ApiError> {
    Ok(Json(state.coordinator.list_messages(&id).await?))
}

/// POST /support/sessions/:id/messages
///
/// Visitors post anonymously; messages sent as an agent need the admin token.
pub async fn append_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    JsonBody(request): JsonBody<NewMessage>,
) -> Result<(StatusCode, Json<Message>), ApiError> {
    if request.sender_type == SenderType::Agent {
        let header = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        authorize(state.admin_token.as_deref(), header)?;
    }
    let message = state.coordinator.append_message(&id, request).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

/// PUT /support/sessions/:id/messages/read
pub async fn mark_read(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    JsonBody(request): JsonBody<MarkRead>,
) -> Result<Json<ReadReceipt>, ApiError> {
    Ok(Json(state.coordinator.mark_read(&id, request).await?))
}
