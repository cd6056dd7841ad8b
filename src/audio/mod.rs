pub mod capture;
pub mod file;
pub mod permission;
pub mod player;
pub mod recorder;
pub mod wav_recorder;

pub use capture::{AudioFormat, AudioFrame, CaptureSource, ToneConfig, ToneSource};
pub use file::AudioFile;
pub use permission::{Permission, PermissionPolicy, PermissionService, Rationale, StaticPermission};
pub use player::{
    ClipInfo, FilePlayer, FilePlayerConfig, MeterSink, NullSink, PlaybackDone, PlaybackSink,
    PlayerService,
};
pub use recorder::{
    AudioEncoding, AudioQuality, CompletionSource, RecorderEvent, RecorderService,
    RecordingOptions,
};
pub use wav_recorder::{WavRecorder, WavRecorderConfig};
