//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::track_http_metrics;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        // Real-time relay endpoint
        .route("/ws", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_http_metrics))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/chat", chat_routes())
        .nest("/calls", call_routes())
}

/// Message send, read and soft-delete routes
fn chat_routes() -> Router<AppState> {
    Router::new()
        .route("/send", post(handlers::message::send_message))
        .route("/messages/{user_id}", get(handlers::message::get_messages))
        .route("/message-history/{user_id}", get(handlers::message::get_message_history))
        .route("/last-message/{user_id}", get(handlers::message::get_last_message))
        .route("/soft-delete", post(handlers::message::soft_delete))
        .route("/auto-soft-delete", post(handlers::message::auto_soft_delete))
}

/// Call history routes
fn call_routes() -> Router<AppState> {
    Router::new()
        .route("/history/{user_id}", get(handlers::call::get_call_history))
        .route("/{call_id}", get(handlers::call::get_call))
}
