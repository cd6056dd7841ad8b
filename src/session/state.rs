use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::audio::CompletionSource;

/// Lifecycle phase of the recording session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Recording,
    Paused,
    Stopped,
}

impl Phase {
    /// Recording or paused: the recorder still owns the file
    pub fn is_active(self) -> bool {
        matches!(self, Phase::Recording | Phase::Paused)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Recording => "recording",
            Phase::Paused => "paused",
            Phase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Microphone permission, resolved once at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    Unknown,
    Granted,
    Denied,
}

/// A recording stop that has been confirmed
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingFinalized {
    pub succeeded: bool,
    pub path: PathBuf,
    pub source: CompletionSource,
}

/// Bookkeeping for the last finalized take
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalizedRecording {
    pub succeeded: bool,
    pub path: PathBuf,
    pub duration_secs: u64,
    pub source: CompletionSource,
    pub finalized_at: DateTime<Utc>,
}

/// State owned by the session controller
#[derive(Debug, Clone)]
pub struct RecordingSession {
    /// Identifier used to correlate log lines (e.g. "memo-3f2a…")
    pub session_id: String,
    pub phase: Phase,
    /// Last reported progress tick, in whole seconds
    pub elapsed_seconds: u64,
    /// Fixed destination of the current/most recent take
    pub audio_file_path: PathBuf,
    pub permission: PermissionState,
    pub last_finalized: Option<FinalizedRecording>,
}

impl RecordingSession {
    pub fn new(audio_file_path: PathBuf) -> Self {
        Self {
            session_id: format!("memo-{}", uuid::Uuid::new_v4()),
            phase: Phase::Idle,
            elapsed_seconds: 0,
            audio_file_path,
            permission: PermissionState::Unknown,
            last_finalized: None,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id.clone(),
            phase: self.phase,
            permission: self.permission,
            elapsed_seconds: self.elapsed_seconds,
            audio_file_path: self.audio_file_path.clone(),
            last_finalized: self.last_finalized.clone(),
        }
    }
}

/// Read-only copy of the session, published to observers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub phase: Phase,
    pub permission: PermissionState,
    pub elapsed_seconds: u64,
    pub audio_file_path: PathBuf,
    pub last_finalized: Option<FinalizedRecording>,
}

impl SessionSnapshot {
    pub fn view(&self) -> ViewState {
        ViewState::from(self)
    }
}

/// What a view needs to render its buttons and elapsed-time text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub recording: bool,
    pub paused: bool,
    pub current_time: u64,
}

impl From<&SessionSnapshot> for ViewState {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self {
            recording: snapshot.phase == Phase::Recording,
            paused: snapshot.phase == Phase::Paused,
            current_time: snapshot.elapsed_seconds,
        }
    }
}

impl fmt::Display for ViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.recording {
            "● REC"
        } else if self.paused {
            "‖ PAUSED"
        } else {
            "■"
        };
        write!(f, "{} {}s", status, self.current_time)
    }
}
