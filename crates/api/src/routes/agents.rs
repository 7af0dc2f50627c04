//! Agent directory endpoint.

use axum::{extract::State, Json};
use support_core::AgentLoad;

use crate::extractors::AdminAuth;
use crate::response::ApiError;
use crate::state::AppState;

/// GET /support/agents - assignable agents with their current load.
pub async fn list_agents(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<Vec<AgentLoad>>, ApiError> {
    Ok(Json(state.coordinator.list_agents().await?))
}
