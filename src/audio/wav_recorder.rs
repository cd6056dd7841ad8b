use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::capture::{AudioFormat, AudioFrame, CaptureSource};
use super::recorder::{AudioEncoding, CompletionSource, RecorderEvent, RecorderService, RecordingOptions};

/// Configuration for the WAV recorder
#[derive(Debug, Clone)]
pub struct WavRecorderConfig {
    /// How much recorded audio between two progress events
    pub progress_interval: Duration,
    /// How this recorder reports finalization
    pub completion_source: CompletionSource,
}

impl Default for WavRecorderConfig {
    fn default() -> Self {
        Self {
            progress_interval: Duration::from_millis(250),
            completion_source: CompletionSource::StopResult,
        }
    }
}

struct PreparedTake {
    path: PathBuf,
    options: RecordingOptions,
}

struct ActiveTake {
    paused: Arc<AtomicBool>,
    writer: JoinHandle<Result<u64>>,
}

/// Recorder that writes frames from a capture source to a 16-bit PCM WAV file
pub struct WavRecorder<S: CaptureSource> {
    source: S,
    config: WavRecorderConfig,
    take: Option<PreparedTake>,
    active: Option<ActiveTake>,
    events: Option<mpsc::UnboundedSender<RecorderEvent>>,
}

impl<S: CaptureSource> WavRecorder<S> {
    pub fn new(source: S, config: WavRecorderConfig) -> Self {
        info!(
            "WAV recorder initialized (source: {}, completion: {:?})",
            source.name(),
            config.completion_source
        );

        Self {
            source,
            config,
            take: None,
            active: None,
            events: None,
        }
    }

    /// Whether a take is currently open (recording or paused)
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    fn emit(&self, event: RecorderEvent) {
        if let Some(tx) = &self.events {
            // A dropped subscriber just means nobody is listening anymore
            let _ = tx.send(event);
        }
    }
}

#[async_trait::async_trait]
impl<S: CaptureSource> RecorderService for WavRecorder<S> {
    fn configure(&mut self, path: &Path, options: &RecordingOptions) -> Result<()> {
        if self.active.is_some() {
            bail!("Cannot prepare a new take while recording");
        }
        if options.encoding != AudioEncoding::Lpcm {
            bail!(
                "Encoding {:?} is not supported by the WAV recorder (use lpcm)",
                options.encoding
            );
        }
        if options.sample_rate == 0 || options.channels == 0 {
            bail!(
                "Invalid recording format: {}Hz, {} channels",
                options.sample_rate,
                options.channels
            );
        }

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create recordings directory")?;
        }

        // Preparing a take resets whatever was recorded at this path before
        match fs::remove_file(path) {
            Ok(()) => debug!("Removed previous take at {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to reset {}", path.display()))
            }
        }

        info!(
            "Prepared take at {} ({}Hz, {} channels, {:?}, {}bps)",
            path.display(),
            options.sample_rate,
            options.channels,
            options.quality,
            options.bit_rate
        );

        self.take = Some(PreparedTake {
            path: path.to_path_buf(),
            options: options.clone(),
        });

        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        if let Some(active) = &self.active {
            if active.paused.swap(false, Ordering::SeqCst) {
                info!("Recording resumed");
                return Ok(());
            }
            bail!("Already recording");
        }

        let take = self
            .take
            .as_ref()
            .context("No take prepared; call configure() first")?;

        let spec = WavSpec {
            channels: take.options.channels,
            sample_rate: take.options.sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(&take.path, spec)
            .with_context(|| format!("Failed to create {}", take.path.display()))?;

        let format = AudioFormat {
            sample_rate: take.options.sample_rate,
            channels: take.options.channels,
        };
        let frames = self
            .source
            .start(format)
            .await
            .context("Failed to start audio capture")?;

        let paused = Arc::new(AtomicBool::new(false));
        let writer_task = spawn_writer(
            writer,
            frames,
            format,
            Arc::clone(&paused),
            self.events.clone(),
            self.config.progress_interval,
        );

        self.active = Some(ActiveTake {
            paused,
            writer: writer_task,
        });

        info!("Recording started: {}", take.path.display());

        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        let active = self.active.as_ref().context("Not recording")?;
        if active.paused.swap(true, Ordering::SeqCst) {
            bail!("Already paused");
        }
        info!("Recording paused");
        Ok(())
    }

    async fn stop(&mut self) -> Result<PathBuf> {
        let active = self.active.take().context("Not recording")?;
        let take = self.take.take().context("No take prepared")?;

        if let Err(e) = self.source.stop().await {
            warn!("Failed to stop capture source: {:#}", e);
        }

        let written = match active.writer.await {
            Ok(result) => result,
            Err(e) => Err(anyhow::anyhow!("Recording writer task panicked: {}", e)),
        };

        if self.config.completion_source == CompletionSource::FinishedEvent {
            self.emit(RecorderEvent::Finished {
                succeeded: written.is_ok(),
                path: take.path.clone(),
            });
        }

        let samples = written.context("Failed to finalize recording")?;
        info!(
            "Recording stopped: {} ({} samples)",
            take.path.display(),
            samples
        );

        Ok(take.path)
    }

    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<RecorderEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        rx
    }

    fn completion_source(&self) -> CompletionSource {
        self.config.completion_source
    }

    fn name(&self) -> &str {
        "WAV recorder"
    }
}

/// Append incoming frames to the WAV file until the capture channel closes
fn spawn_writer(
    mut writer: WavWriter<std::io::BufWriter<fs::File>>,
    mut frames: mpsc::Receiver<AudioFrame>,
    format: AudioFormat,
    paused: Arc<AtomicBool>,
    events: Option<mpsc::UnboundedSender<RecorderEvent>>,
    progress_interval: Duration,
) -> JoinHandle<Result<u64>> {
    tokio::task::spawn_blocking(move || -> Result<u64> {
        let samples_per_second = format.sample_rate as f64 * format.channels as f64;
        let interval = progress_interval.as_secs_f64();
        let mut written: u64 = 0;
        let mut last_progress = 0.0f64;

        while let Some(frame) = frames.blocking_recv() {
            if paused.load(Ordering::SeqCst) {
                continue;
            }
            if frame.sample_rate != format.sample_rate || frame.channels != format.channels {
                warn!(
                    "Dropping frame with unexpected format ({}Hz, {} channels)",
                    frame.sample_rate, frame.channels
                );
                continue;
            }

            for sample in &frame.samples {
                writer
                    .write_sample(*sample)
                    .context("Failed to write audio sample")?;
            }
            written += frame.samples.len() as u64;

            let current_time = written as f64 / samples_per_second;
            if current_time - last_progress >= interval {
                last_progress = current_time;
                if let Some(tx) = &events {
                    let _ = tx.send(RecorderEvent::Progress { current_time });
                }
            }
        }

        writer.finalize().context("Failed to finalize WAV file")?;
        Ok(written)
    })
}
