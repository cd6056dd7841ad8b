//! Recording session management
//!
//! This module provides the `RecordingSessionController` that manages:
//! - Microphone permission, resolved once at startup
//! - The Idle/Recording/Paused/Stopped lifecycle of a single take
//! - Forwarding record/pause/stop/play intents to the recorder and player
//! - Progress and finalization bookkeeping
//!
//! `SessionHandle` runs a controller on its own task and serializes intents
//! from any number of callers.

mod config;
mod controller;
mod handle;
mod outcome;
mod state;

pub use config::SessionConfig;
pub use controller::RecordingSessionController;
pub use handle::SessionHandle;
pub use outcome::{Intent, Outcome, SessionError};
pub use state::{
    FinalizedRecording, PermissionState, Phase, RecordingFinalized, RecordingSession,
    SessionSnapshot, ViewState,
};
