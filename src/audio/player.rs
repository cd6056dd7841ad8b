use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::capture::AudioFrame;
use super::file::AudioFile;

/// Resolves with `true` once playback reached the end, `false` if it failed
pub type PlaybackDone = oneshot::Receiver<bool>;

/// Description of a clip that is loaded and ready to play
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipInfo {
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
}

/// Sound playback service
#[async_trait::async_trait]
pub trait PlayerService: Send {
    /// Load a file. Resolves once the clip is decoded and ready to play.
    async fn load(&mut self, path: &Path) -> Result<ClipInfo>;

    /// Start playing the loaded clip
    async fn play(&mut self) -> Result<PlaybackDone>;

    /// Get player name for logging
    fn name(&self) -> &str;
}

/// Output device for decoded frames
pub trait PlaybackSink: Send + 'static {
    fn write(&mut self, frame: &AudioFrame) -> Result<()>;
}

/// Discards every frame
#[derive(Debug, Default)]
pub struct NullSink;

impl PlaybackSink for NullSink {
    fn write(&mut self, _frame: &AudioFrame) -> Result<()> {
        Ok(())
    }
}

/// Logs the peak level of each frame
#[derive(Debug, Default)]
pub struct MeterSink;

impl PlaybackSink for MeterSink {
    fn write(&mut self, frame: &AudioFrame) -> Result<()> {
        let peak = frame.peak();
        let bars = (peak * 40.0).round() as usize;
        debug!("{:>6}ms |{:<40}|", frame.timestamp_ms, "#".repeat(bars));
        Ok(())
    }
}

/// Configuration for the file player
#[derive(Debug, Clone)]
pub struct FilePlayerConfig {
    /// Frame size in milliseconds
    pub buffer_duration_ms: u64,
    /// Push frames as fast as possible instead of in real time
    pub unpaced: bool,
}

impl Default for FilePlayerConfig {
    fn default() -> Self {
        Self {
            buffer_duration_ms: 100,
            unpaced: false,
        }
    }
}

/// Player that decodes a file up front and streams it to a sink in real time
pub struct FilePlayer<K: PlaybackSink> {
    config: FilePlayerConfig,
    sink: Arc<std::sync::Mutex<K>>,
    clip: Option<Arc<AudioFile>>,
    playback: Option<JoinHandle<()>>,
}

impl<K: PlaybackSink> FilePlayer<K> {
    pub fn new(sink: K, config: FilePlayerConfig) -> Self {
        Self {
            config,
            sink: Arc::new(std::sync::Mutex::new(sink)),
            clip: None,
            playback: None,
        }
    }

    fn abort_playback(&mut self) {
        if let Some(handle) = self.playback.take() {
            if !handle.is_finished() {
                info!("Interrupting previous playback");
                handle.abort();
            }
        }
    }
}

#[async_trait::async_trait]
impl<K: PlaybackSink> PlayerService for FilePlayer<K> {
    async fn load(&mut self, path: &Path) -> Result<ClipInfo> {
        let owned = path.to_path_buf();
        let clip = tokio::task::spawn_blocking(move || AudioFile::open(owned))
            .await
            .context("Decoder task panicked")??;

        let info = ClipInfo {
            path: path.to_path_buf(),
            duration_seconds: clip.duration_seconds,
            sample_rate: clip.sample_rate,
            channels: clip.channels,
        };

        self.clip = Some(Arc::new(clip));
        Ok(info)
    }

    async fn play(&mut self) -> Result<PlaybackDone> {
        let clip = Arc::clone(self.clip.as_ref().context("No clip loaded")?);
        self.abort_playback();

        let (done_tx, done_rx) = oneshot::channel();
        let sink = Arc::clone(&self.sink);
        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            let frame_len = ((clip.sample_rate as u64 * config.buffer_duration_ms) / 1000).max(1)
                as usize
                * clip.channels as usize;
            let mut ticker =
                tokio::time::interval(Duration::from_millis(config.buffer_duration_ms.max(1)));
            let mut timestamp_ms = 0u64;
            let mut succeeded = true;

            for chunk in clip.samples.chunks(frame_len) {
                if !config.unpaced {
                    ticker.tick().await;
                }

                let frame = AudioFrame {
                    samples: chunk.to_vec(),
                    sample_rate: clip.sample_rate,
                    channels: clip.channels,
                    timestamp_ms,
                };
                timestamp_ms += config.buffer_duration_ms;

                let written = match sink.lock() {
                    Ok(mut sink) => sink.write(&frame),
                    Err(_) => Err(anyhow::anyhow!("Playback sink poisoned")),
                };
                if let Err(e) = written {
                    error!("Playback sink error: {:#}", e);
                    succeeded = false;
                    break;
                }
            }

            let _ = done_tx.send(succeeded);
        });

        self.playback = Some(handle);
        Ok(done_rx)
    }

    fn name(&self) -> &str {
        "File player"
    }
}
