//! API routes.

pub mod agents;
pub mod config;
pub mod health;
pub mod messages;
pub mod sessions;
pub mod transfers;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::middleware::latency::record_latency;
use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let support = Router::new()
        .route(
            "/sessions",
            post(sessions::create_session).get(sessions::list_sessions),
        )
        .route(
            "/sessions/:id",
            get(sessions::get_session)
                .put(sessions::update_session)
                .delete(sessions::delete_session),
        )
        .route("/sessions/:id/assign", post(sessions::assign_session))
        .route(
            "/sessions/:id/messages",
            get(messages::list_messages).post(messages::append_message),
        )
        .route("/sessions/:id/messages/read", put(messages::mark_read))
        .route(
            "/transfers",
            get(transfers::list_transfers).post(transfers::create_transfer),
        )
        .route(
            "/transfers/:id",
            get(transfers::get_transfer).put(transfers::update_transfer),
        )
        .route("/config", get(config::get_config).put(config::update_config))
        .route("/agents", get(agents::list_agents));

    Router::new()
        .nest("/support", support)
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .route("/metrics", get(health::metrics_handler))
        .layer(middleware::from_fn(record_latency))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
