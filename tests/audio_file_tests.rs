// Integration tests for audio file decoding and playback
//
// Fixtures are generated on the fly with hound so the tests don't depend on
// checked-in audio.

use anyhow::{bail, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use voice_memo::audio::{
    AudioFile, AudioFrame, FilePlayer, FilePlayerConfig, PlaybackSink, PlayerService,
};

fn write_fixture(dir: &Path, name: &str, sample_rate: u32, channels: u16, samples: &[i16]) -> Result<PathBuf> {
    let path = dir.join(name);
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec)?;
    for sample in samples {
        writer.write_sample(*sample)?;
    }
    writer.finalize()?;
    Ok(path)
}

/// Ramp so every sample is distinguishable
fn ramp(len: usize) -> Vec<i16> {
    (0..len).map(|i| (i % 30000) as i16).collect()
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let samples = ramp(22050);
    let path = write_fixture(temp_dir.path(), "memo.wav", 22050, 1, &samples)?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 22050);
    assert_eq!(audio.channels, 1);
    assert!((audio.duration_seconds - 1.0).abs() < 1e-6, "Duration should be 1s");
    assert_eq!(audio.samples, samples);
    assert!(audio.path.contains("memo.wav"));

    Ok(())
}

#[test]
fn test_audio_file_stereo_duration() -> Result<()> {
    let temp_dir = TempDir::new()?;
    // 0.5s of interleaved stereo at 16kHz
    let path = write_fixture(temp_dir.path(), "stereo.wav", 16000, 2, &ramp(16000))?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.channels, 2);
    assert_eq!(audio.samples.len(), 16000);
    assert!((audio.duration_seconds - 0.5).abs() < 1e-6);

    Ok(())
}

#[test]
fn test_audio_file_empty_recording() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_fixture(temp_dir.path(), "empty.wav", 22050, 1, &[])?;

    let audio = AudioFile::open(&path)?;

    assert!(audio.samples.is_empty());
    assert_eq!(audio.duration_seconds, 0.0);

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");
    let result = AudioFile::open(&path);

    assert!(result.is_err(), "Opening nonexistent file should fail");
}

#[test]
fn test_audio_file_rejects_garbage() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("noise.wav");
    std::fs::write(&path, b"definitely not a RIFF header")?;

    assert!(AudioFile::open(&path).is_err());

    Ok(())
}

#[derive(Clone, Default)]
struct CollectSink {
    frames: Arc<Mutex<Vec<AudioFrame>>>,
    fail_after: Option<usize>,
}

impl PlaybackSink for CollectSink {
    fn write(&mut self, frame: &AudioFrame) -> Result<()> {
        let mut frames = self.frames.lock().unwrap();
        if Some(frames.len()) == self.fail_after {
            bail!("device unplugged");
        }
        frames.push(frame.clone());
        Ok(())
    }
}

fn unpaced() -> FilePlayerConfig {
    FilePlayerConfig {
        buffer_duration_ms: 100,
        unpaced: true,
    }
}

#[tokio::test]
async fn test_player_streams_whole_clip() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let samples = ramp(22050);
    let path = write_fixture(temp_dir.path(), "memo.wav", 22050, 1, &samples)?;

    let sink = CollectSink::default();
    let mut player = FilePlayer::new(sink.clone(), unpaced());

    let clip = player.load(&path).await?;
    assert_eq!(clip.path, path);
    assert_eq!(clip.sample_rate, 22050);
    assert!((clip.duration_seconds - 1.0).abs() < 1e-6);

    let done = player.play().await?;
    assert!(done.await?, "Playback should report success");

    let frames = sink.frames.lock().unwrap();
    assert_eq!(frames.len(), 10, "1s in 100ms frames");
    assert_eq!(frames[0].samples.len(), 2205);
    assert_eq!(frames[9].timestamp_ms, 900);

    let played: Vec<i16> = frames.iter().flat_map(|f| f.samples.clone()).collect();
    assert_eq!(played, samples);

    Ok(())
}

#[tokio::test]
async fn test_player_reports_sink_failure() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = write_fixture(temp_dir.path(), "memo.wav", 16000, 1, &ramp(16000))?;

    let sink = CollectSink {
        fail_after: Some(3),
        ..CollectSink::default()
    };
    let mut player = FilePlayer::new(sink.clone(), unpaced());

    player.load(&path).await?;
    let done = player.play().await?;

    assert!(!done.await?, "Playback should report failure");
    assert_eq!(sink.frames.lock().unwrap().len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_player_requires_loaded_clip() {
    let mut player = FilePlayer::new(CollectSink::default(), unpaced());

    assert!(player.play().await.is_err());
}

#[tokio::test]
async fn test_player_load_missing_file_fails() {
    let mut player = FilePlayer::new(CollectSink::default(), unpaced());

    let result = player.load(Path::new("/nonexistent/memo.wav")).await;

    assert!(result.is_err());
}
