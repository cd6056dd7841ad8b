use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use super::state::Phase;

/// Something the user (or a front end) asked the session to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Initialize,
    Record,
    Pause,
    Stop,
    Play,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Intent::Initialize => "initialize",
            Intent::Record => "record",
            Intent::Pause => "pause",
            Intent::Stop => "stop",
            Intent::Play => "play",
        };
        f.write_str(name)
    }
}

/// Why an intent did not fully succeed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("microphone permission not granted")]
    PermissionDenied,

    #[error("can't {intent} while {phase}")]
    InvalidTransition { intent: Intent, phase: Phase },

    #[error("{operation} failed: {message}")]
    ServiceCall {
        operation: &'static str,
        message: String,
    },

    #[error("failed to load {}: {message}", .path.display())]
    LoadFailure { path: PathBuf, message: String },

    #[error("playback failed: {message}")]
    PlaybackFailure { message: String },
}

impl SessionError {
    pub(crate) fn service(operation: &'static str, error: &anyhow::Error) -> Self {
        Self::ServiceCall {
            operation,
            message: format!("{:#}", error),
        }
    }

    /// Rejected before any service call was made
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            SessionError::PermissionDenied | SessionError::InvalidTransition { .. }
        )
    }
}

impl Serialize for SessionError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Result of applying one intent
///
/// Controller operations never fail outright; whatever went wrong is carried in `error`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    pub intent: Intent,
    pub from: Phase,
    pub to: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SessionError>,
}

impl Outcome {
    pub(crate) fn applied(intent: Intent, from: Phase, to: Phase) -> Self {
        Self {
            intent,
            from,
            to,
            error: None,
        }
    }

    pub(crate) fn failed(intent: Intent, from: Phase, to: Phase, error: SessionError) -> Self {
        Self {
            intent,
            from,
            to,
            error: Some(error),
        }
    }

    pub(crate) fn rejected(intent: Intent, phase: Phase, error: SessionError) -> Self {
        Self::failed(intent, phase, phase, error)
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    pub fn is_rejected(&self) -> bool {
        self.error.as_ref().map(SessionError::is_rejection).unwrap_or(false)
    }

    pub fn changed_phase(&self) -> bool {
        self.from != self.to
    }
}
