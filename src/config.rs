use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::{
    AudioEncoding, AudioQuality, CompletionSource, FilePlayerConfig, PermissionPolicy,
    RecordingOptions, ToneConfig, WavRecorderConfig,
};
use crate::session::SessionConfig;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub recording: RecordingConfig,
    pub capture: CaptureConfig,
    pub playback: PlaybackConfig,
    pub platform: PlatformConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct RecordingConfig {
    pub directory: String,
    pub file_name: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub quality: AudioQuality,
    pub encoding: AudioEncoding,
    pub bit_rate: u32,
    pub progress_interval_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct CaptureConfig {
    pub tone_hz: f32,
    pub amplitude: f32,
    pub buffer_duration_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackConfig {
    pub buffer_duration_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct PlatformConfig {
    /// Answer to the microphone permission prompt
    pub microphone: PermissionPolicy,
    /// How the recorder reports that a take is finalized
    pub completion: CompletionSource,
}

impl Config {
    /// Load `path` (any extension `config` understands), then apply
    /// `VOICE_MEMO__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix("VOICE_MEMO")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }

    /// Fixed destination of every take, with `~` expanded
    pub fn audio_file_path(&self) -> Result<PathBuf> {
        let directory = shellexpand::full(&self.recording.directory)
            .context("Failed to expand recordings directory")?;
        Ok(PathBuf::from(directory.as_ref()).join(&self.recording.file_name))
    }

    pub fn recording_options(&self) -> RecordingOptions {
        RecordingOptions {
            sample_rate: self.recording.sample_rate,
            channels: self.recording.channels,
            quality: self.recording.quality,
            encoding: self.recording.encoding,
            bit_rate: self.recording.bit_rate,
        }
    }

    pub fn session_config(&self) -> Result<SessionConfig> {
        Ok(SessionConfig {
            app_name: self.service.name.clone(),
            audio_file_path: self.audio_file_path()?,
            options: self.recording_options(),
        })
    }

    pub fn recorder_config(&self) -> WavRecorderConfig {
        WavRecorderConfig {
            progress_interval: Duration::from_millis(self.recording.progress_interval_ms),
            completion_source: self.platform.completion,
        }
    }

    pub fn tone_config(&self) -> ToneConfig {
        ToneConfig {
            frequency_hz: self.capture.tone_hz,
            amplitude: self.capture.amplitude,
            buffer_duration_ms: self.capture.buffer_duration_ms,
            unpaced: false,
        }
    }

    pub fn player_config(&self) -> FilePlayerConfig {
        FilePlayerConfig {
            buffer_duration_ms: self.playback.buffer_duration_ms,
            unpaced: false,
        }
    }
}
