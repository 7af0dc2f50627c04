//! Request extractors.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{header, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;

use crate::middleware::auth::authorize;
use crate::response::ApiError;
use crate::state::AppState;

/// JSON body whose parse failures surface as VALID_001.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

/// Query string whose parse failures surface as VALID_001.
#[derive(Debug, Clone)]
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::from_request_parts(parts, state).await {
            Ok(Query(value)) => Ok(QueryParams(value)),
            Err(rejection) => Err(ApiError::bad_request(rejection.body_text())),
        }
    }
}

/// Marker for routes reserved to agents and administrators.
#[derive(Debug, Clone, Copy)]
pub struct AdminAuth;

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        authorize(state.admin_token.as_deref(), auth_header)?;
        Ok(AdminAuth)
    }
}

/// Per-client admission for visitor-facing writes.
#[derive(Debug, Clone)]
pub struct VisitorRateLimit;

#[async_trait]
impl FromRequestParts<AppState> for VisitorRateLimit {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let ClientIp(ip) = match ClientIp::from_request_parts(parts, state).await {
            Ok(ip) => ip,
            Err(never) => match never {},
        };
        let key = ip.as_deref().unwrap_or("unknown");

        state.rate_limiter.check(key).map_err(|retry_after| {
            ApiError::rate_limited(
                "Too many sessions opened, try again later",
                Some(retry_after),
            )
        })?;
        Ok(VisitorRateLimit)
    }
}

/// Client IP address.
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Try X-Forwarded-For first (for proxied requests)
        if let Some(xff) = parts.headers.get("X-Forwarded-For") {
            if let Ok(xff_str) = xff.to_str() {
                // Take the first IP in the chain
                if let Some(ip) = xff_str.split(',').next() {
                    return Ok(ClientIp(Some(ip.trim().to_string())));
                }
            }
        }

        if let Some(real_ip) = parts.headers.get("X-Real-IP") {
            if let Ok(ip) = real_ip.to_str() {
                return Ok(ClientIp(Some(ip.to_string())));
            }
        }

        Ok(ClientIp(None))
    }
}
