//! Session endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use coordinator::sessions::SessionQuery;
use coordinator::{SessionDetail, SessionPage};
use serde::Deserialize;
use support_core::{NewSession, PageRequest, Priority, SessionFilter, SessionStatus, SessionUpdate};
use tracing::debug;

use crate::extractors::{AdminAuth, ClientIp, JsonBody, QueryParams, VisitorRateLimit};
use crate::response::ApiError;
use crate::state::AppState;

/// Query string for `GET /support/sessions`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionsParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<SessionStatus>,
    pub assigned_to: Option<String>,
    pub priority: Option<Priority>,
    #[serde(default)]
    pub admin_view: bool,
}

impl From<ListSessionsParams> for SessionQuery {
    fn from(params: ListSessionsParams) -> Self {
        SessionQuery {
            filter: SessionFilter {
                status: params.status,
                assigned_to: params.assigned_to,
                priority: params.priority,
            },
            page: PageRequest::new(params.page, params.limit),
            admin_view: params.admin_view,
        }
    }
}

/// POST /support/sessions
pub async fn create_session(
    State(state): State<AppState>,
    _limit: VisitorRateLimit,
    ClientIp(ip): ClientIp,
    JsonBody(request): JsonBody<NewSession>,
) -> Result<(StatusCode, Json<SessionDetail>), ApiError> {
    debug!(client_ip = ?ip, "Opening support session");
    let detail = state.coordinator.create_session(request).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /support/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    _auth: AdminAuth,
    QueryParams(params): QueryParams<ListSessionsParams>,
) -> Result<Json<SessionPage>, ApiError> {
    let page = state.coordinator.list_sessions(params.into()).await?;
    Ok(Json(page))
}

/// GET /support/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionDetail>, ApiError> {
    Ok(Json(state.coordinator.get_session(&id).await?))
}

/// PUT /support/sessions/:id
pub async fn update_session(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<SessionUpdate>,
) -> Result<Json<SessionDetail>, ApiError> {
    Ok(Json(state.coordinator.update_session(&id, update).await?))
}

/// DELETE /support/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<SessionDetail>, ApiError> {
    Ok(Json(state.coordinator.delete_session(&id).await?))
}

/// POST /support/sessions/:id/assign
pub async fn assign_session(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(id): Path<String>,
) -> Result<Json<SessionDetail>, ApiError> {
    Ok(Json(state.coordinator.assign_session(&id).await?))
}
