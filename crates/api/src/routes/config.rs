//! Support configuration endpoints.

use axum::{extract::State, Json};
use support_core::{SupportConfig, SupportConfigUpdate};

use crate::extractors::{AdminAuth, JsonBody};
use crate::response::ApiError;
use crate::state::AppState;

/// GET /support/config
pub async fn get_config(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<SupportConfig>, ApiError> {
    Ok(Json(state.coordinator.get_config().await?))
}

/// PUT /support/config
pub async fn update_config(
    State(state): State<AppState>,
    _auth: AdminAuth,
    JsonBody(update): JsonBody<SupportConfigUpdate>,
) -> Result<Json<SupportConfig>, ApiError> {
    Ok(Json(state.coordinator.update_config(update).await?))
}
