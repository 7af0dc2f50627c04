//! Transfer endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use support_core::{NewTransfer, Transfer, TransferFilter, TransferStatus, TransferUpdate};

use crate::extractors::{AdminAuth, JsonBody, QueryParams};
use crate::response::ApiError;
use crate::state::AppState;

/// Query string for `GET /support/transfers`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTransfersParams {
    pub session_id: Option<String>,
    pub status: Option<TransferStatus>,
}

/// GET /support/transfers
pub async fn list_transfers(
    State(state): State<AppState>,
    _auth: AdminAuth,
    QueryParams(params): QueryParams<ListTransfersParams>,
) -> Result<Json<Vec<Transfer>>, ApiError> {
    let filter = TransferFilter {
        session_id: params.session_id,
        status: params.status,
    };
    Ok(Json(state.coordinator.list_transfers(filter).await?))
}

/// POST /support/transfers
pub async fn create_transfer(
    State(state): State<AppState>,
    _auth: AdminAuth,
    JsonBody(request): JsonBody<NewTransfer>,
) -> Result<(StatusCode, Json<Transfer>), ApiError> {
    let transfer = state.coordinator.create_transfer(request).await?;
    Ok((StatusCode::CREATED, Json(transfer)))
}

/// GET /support/transfers/:id
pub async fn get_transfer(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<Transfer>, ApiError> {
    Ok(Json(state.coordinator.get_transfer(&id).await?))
}

/// PUT /support/transfers/:id
pub async fn update_transfer(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<TransferUpdate>,
) -> Result<Json<Transfer>, ApiError> {
    Ok(Json(state.coordinator.update_transfer(&id, update).await?))
}
