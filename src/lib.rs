pub mod audio;
pub mod config;
pub mod http;
pub mod session;

pub use audio::{
    AudioEncoding, AudioFile, AudioFrame, AudioQuality, CaptureSource, CompletionSource,
    FilePlayer, PermissionService, PlayerService, RecorderEvent, RecorderService,
    RecordingOptions, ToneSource, WavRecorder,
};
pub use config::Config;
pub use http::{create_router, AppState};
pub use session::{
    Intent, Outcome, Phase, RecordingSessionController, SessionConfig, SessionError,
    SessionHandle, SessionSnapshot, ViewState,
};
