use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session intents
        .route("/session/record", post(handlers::record))
        .route("/session/pause", post(handlers::pause))
        .route("/session/stop", post(handlers::stop))
        .route("/session/play", post(handlers::play))
        // Session queries
        .route("/session", get(handlers::get_session))
        .route("/session/view", get(handlers::get_view))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
