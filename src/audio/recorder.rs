use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

/// Encoder quality preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioQuality {
    Low,
    Medium,
    High,
}

/// Container/codec the recorder should produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioEncoding {
    /// Uncompressed 16-bit PCM in a WAV container
    Lpcm,
    /// AAC in an ADTS/M4A container
    Aac,
}

/// Encoding configuration handed to the recorder when a take is prepared
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingOptions {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,
    pub quality: AudioQuality,
    pub encoding: AudioEncoding,
    /// Target bit rate in bits per second (ignored by uncompressed encoders)
    pub bit_rate: u32,
}

impl Default for RecordingOptions {
    fn default() -> Self {
        Self {
            sample_rate: 22050,
            channels: 1,
            quality: AudioQuality::Low,
            encoding: AudioEncoding::Aac,
            bit_rate: 32000,
        }
    }
}

/// Where the "recording finalized" signal comes from for a given recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionSource {
    /// The path returned by `stop()` is the completion signal
    StopResult,
    /// A separate `RecorderEvent::Finished` arrives after `stop()`
    FinishedEvent,
}

/// Asynchronous notifications from a recorder
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    /// Elapsed recorded time, in seconds
    Progress { current_time: f64 },
    /// The take was finalized (only emitted by `FinishedEvent` recorders)
    Finished { succeeded: bool, path: PathBuf },
}

/// Audio recording service
///
/// The controller owns exactly one recorder and drives it through
/// configure → start → (pause → start)* → stop.
#[async_trait::async_trait]
pub trait RecorderService: Send {
    /// Prepare a take at `path`, discarding any previous take there
    fn configure(&mut self, path: &Path, options: &RecordingOptions) -> Result<()>;

    /// Start recording, or resume after `pause()`
    async fn start(&mut self) -> Result<()>;

    /// Pause recording without closing the file
    async fn pause(&mut self) -> Result<()>;

    /// Stop recording. Resolves with the final file path once the file is released.
    async fn stop(&mut self) -> Result<PathBuf>;

    /// Register for progress/finished notifications
    ///
    /// A new subscription replaces any previous one.
    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<RecorderEvent>;

    /// How this recorder signals that a take is finalized
    fn completion_source(&self) -> CompletionSource;

    /// Get recorder name for logging
    fn name(&self) -> &str;
}
