use anyhow::{bail, Result};
use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

/// Audio sample data (16-bit PCM, interleaved)
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Raw audio samples (i16 PCM, interleaved)
    pub samples: Vec<i16>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: u16,
    /// Timestamp in milliseconds since capture started
    pub timestamp_ms: u64,
}

impl AudioFrame {
    /// Duration of this frame in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.sample_rate as f64 * self.channels as f64)
    }

    /// Peak absolute amplitude, normalized to 0.0..=1.0
    pub fn peak(&self) -> f32 {
        self.samples
            .iter()
            .map(|s| s.unsigned_abs())
            .max()
            .map(|p| p as f32 / i16::MAX as f32)
            .unwrap_or(0.0)
            .min(1.0)
    }
}

/// Format requested from a capture source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// Live audio input feeding a recorder
///
/// Implementations:
/// - `ToneSource`: synthetic sine tone, paced in real time
#[async_trait::async_trait]
pub trait CaptureSource: Send + Sync {
    /// Start capturing audio
    ///
    /// Returns a channel receiver that will receive audio frames.
    /// The channel closes once the source is stopped.
    async fn start(&mut self, format: AudioFormat) -> Result<mpsc::Receiver<AudioFrame>>;

    /// Stop capturing audio
    async fn stop(&mut self) -> Result<()>;

    /// Check if the source is currently capturing
    fn is_capturing(&self) -> bool;

    /// Get source name for logging
    fn name(&self) -> &str;
}

/// Configuration for the synthetic tone source
#[derive(Debug, Clone)]
pub struct ToneConfig {
    /// Tone frequency in Hz
    pub frequency_hz: f32,
    /// Amplitude (0.0 to 1.0)
    pub amplitude: f32,
    /// Frame size in milliseconds (affects latency)
    pub buffer_duration_ms: u64,
    /// Emit frames as fast as possible instead of in real time
    pub unpaced: bool,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 440.0,
            amplitude: 0.2,
            buffer_duration_ms: 100, // 100ms frames
            unpaced: false,
        }
    }
}

/// Sine tone generator standing in for a microphone
pub struct ToneSource {
    config: ToneConfig,
    running: Option<Arc<AtomicBool>>,
}

impl ToneSource {
    pub fn new(config: ToneConfig) -> Self {
        Self {
            config,
            running: None,
        }
    }
}

#[async_trait::async_trait]
impl CaptureSource for ToneSource {
    async fn start(&mut self, format: AudioFormat) -> Result<mpsc::Receiver<AudioFrame>> {
        if self.is_capturing() {
            bail!("Already capturing");
        }
        if format.sample_rate == 0 || format.channels == 0 {
            bail!(
                "Invalid capture format: {}Hz, {} channels",
                format.sample_rate,
                format.channels
            );
        }

        let (tx, rx) = mpsc::channel(64);
        let running = Arc::new(AtomicBool::new(true));
        let config = self.config.clone();
        let flag = Arc::clone(&running);

        let frames_per_buffer =
            ((format.sample_rate as u64 * config.buffer_duration_ms) / 1000).max(1) as usize;
        let step = TAU * config.frequency_hz / format.sample_rate as f32;
        let scale = config.amplitude.clamp(0.0, 1.0) * i16::MAX as f32;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_millis(config.buffer_duration_ms.max(1)));
            let mut phase = 0.0f32;
            let mut timestamp_ms = 0u64;

            while flag.load(Ordering::SeqCst) {
                if !config.unpaced {
                    ticker.tick().await;
                }

                let mut samples = Vec::with_capacity(frames_per_buffer * format.channels as usize);
                for _ in 0..frames_per_buffer {
                    let value = (phase.sin() * scale) as i16;
                    phase = (phase + step) % TAU;
                    for _ in 0..format.channels {
                        samples.push(value);
                    }
                }

                let frame = AudioFrame {
                    samples,
                    sample_rate: format.sample_rate,
                    channels: format.channels,
                    timestamp_ms,
                };
                timestamp_ms += config.buffer_duration_ms;

                if tx.send(frame).await.is_err() {
                    break;
                }
            }
        });

        info!(
            "Tone capture started ({:.0}Hz tone, {}Hz, {} channels)",
            self.config.frequency_hz, format.sample_rate, format.channels
        );

        self.running = Some(running);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        if let Some(running) = self.running.take() {
            running.store(false, Ordering::SeqCst);
            info!("Tone capture stopped");
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.running
            .as_ref()
            .map(|r| r.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    fn name(&self) -> &str {
        "Synthetic tone"
    }
}
