use std::path::PathBuf;

use crate::audio::{AudioEncoding, RecordingOptions};

/// Configuration for a recording session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name shown in the permission rationale (e.g. "VoiceMemo")
    pub app_name: String,

    /// Fixed destination of every take
    pub audio_file_path: PathBuf,

    /// Encoding handed to the recorder each time a take is prepared
    pub options: RecordingOptions,
}

impl SessionConfig {
    pub fn new(audio_file_path: impl Into<PathBuf>, options: RecordingOptions) -> Self {
        Self {
            audio_file_path: audio_file_path.into(),
            options,
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            app_name: "VoiceMemo".to_string(),
            audio_file_path: PathBuf::from("memo.wav"),
            // WavRecorder only writes PCM
            options: RecordingOptions {
                encoding: AudioEncoding::Lpcm,
                ..RecordingOptions::default()
            },
        }
    }
}
