use super::state::AppState;
use crate::session::{Intent, Outcome, SessionError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{error, info};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// POST /session/record
pub async fn record(State(state): State<AppState>) -> Response {
    apply(&state, Intent::Record).await
}

/// POST /session/pause
pub async fn pause(State(state): State<AppState>) -> Response {
    apply(&state, Intent::Pause).await
}

/// POST /session/stop
pub async fn stop(State(state): State<AppState>) -> Response {
    apply(&state, Intent::Stop).await
}

/// POST /session/play
pub async fn play(State(state): State<AppState>) -> Response {
    apply(&state, Intent::Play).await
}

/// GET /session
pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.snapshot())
}

/// GET /session/view
pub async fn get_view(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.view())
}

async fn apply(state: &AppState, intent: Intent) -> Response {
    info!("HTTP intent: {}", intent);

    match state.session.apply(intent).await {
        Ok(outcome) => (status_for(&outcome), Json(outcome)).into_response(),
        Err(e) => {
            error!("Failed to apply {}: {:#}", intent, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ErrorResponse {
                    error: format!("Failed to apply {}: {}", intent, e),
                }),
            )
                .into_response()
        }
    }
}

/// Map an outcome to a status code: rejected intents are conflicts, service
/// failures are bad gateways
fn status_for(outcome: &Outcome) -> StatusCode {
    match &outcome.error {
        None => StatusCode::OK,
        Some(SessionError::PermissionDenied) | Some(SessionError::InvalidTransition { .. }) => {
            StatusCode::CONFLICT
        }
        Some(_) => StatusCode::BAD_GATEWAY,
    }
}
