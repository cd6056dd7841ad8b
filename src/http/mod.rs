//! HTTP API for driving the recording session from another process
//!
//! This module provides a REST API with the same four intents as the console:
//! - POST /session/record - Start or resume recording
//! - POST /session/pause - Pause recording
//! - POST /session/stop - Stop recording
//! - POST /session/play - Play back the last take
//! - GET /session - Full session snapshot
//! - GET /session/view - Button/timer view state
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
