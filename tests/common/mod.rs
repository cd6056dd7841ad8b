// Scripted stand-ins for the recorder, player and permission services.
//
// Every call is appended to a shared log so tests can assert on call order,
// and failures are switched on through the shared `Script`.

#![allow(dead_code)]

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};
use voice_memo::audio::{
    ClipInfo, CompletionSource, Permission, PermissionService, PlaybackDone, PlayerService,
    Rationale, RecorderEvent, RecorderService, RecordingOptions,
};
use voice_memo::{RecordingSessionController, SessionConfig};

pub const MEMO_PATH: &str = "/tmp/voice-memo-tests/memo.wav";

#[derive(Debug, Default)]
pub struct Script {
    pub fail_configure: bool,
    pub fail_start: bool,
    pub fail_pause: bool,
    pub fail_stop: bool,
    pub fail_load: bool,
    pub fail_play: bool,
    pub playback_fails: bool,
    /// When set, `stop()` waits for this before resolving
    pub stop_gate: Option<oneshot::Receiver<()>>,
    /// Leave the `Finished` event to the test instead of sending it from `stop()`
    pub defer_finished: bool,
}

#[derive(Clone, Default)]
pub struct Probe {
    log: Arc<Mutex<Vec<String>>>,
    script: Arc<Mutex<Script>>,
    events: Arc<Mutex<Option<mpsc::UnboundedSender<RecorderEvent>>>>,
}

impl Probe {
    pub fn calls(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap()
    }

    /// Deliver an event as if the recorder had fired its callback
    pub fn emit(&self, event: RecorderEvent) {
        let events = self.events.lock().unwrap();
        events
            .as_ref()
            .expect("recorder has no subscriber")
            .send(event)
            .unwrap();
    }

    fn record(&self, call: impl Into<String>) {
        self.log.lock().unwrap().push(call.into());
    }
}

pub struct MockRecorder {
    probe: Probe,
    completion: CompletionSource,
    path: Option<PathBuf>,
}

impl MockRecorder {
    pub fn new(probe: Probe, completion: CompletionSource) -> Self {
        Self {
            probe,
            completion,
            path: None,
        }
    }
}

#[async_trait::async_trait]
impl RecorderService for MockRecorder {
    fn configure(&mut self, path: &Path, _options: &RecordingOptions) -> Result<()> {
        self.probe.record("configure");
        if self.probe.script().fail_configure {
            bail!("configure refused");
        }
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        self.probe.record("start");
        if self.probe.script().fail_start {
            bail!("microphone busy");
        }
        Ok(())
    }

    async fn pause(&mut self) -> Result<()> {
        self.probe.record("pause");
        if self.probe.script().fail_pause {
            bail!("pause unsupported");
        }
        Ok(())
    }

    async fn stop(&mut self) -> Result<PathBuf> {
        self.probe.record("stop");

        let gate = self.probe.script().stop_gate.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.probe.record("stop resolved");

        let path = self.path.clone().unwrap_or_else(|| PathBuf::from(MEMO_PATH));
        let failed = self.probe.script().fail_stop;

        if self.completion == CompletionSource::FinishedEvent && !self.probe.script().defer_finished {
            self.probe.emit(RecorderEvent::Finished {
                succeeded: !failed,
                path: path.clone(),
            });
        }

        if failed {
            bail!("encoder crashed");
        }
        Ok(path)
    }

    fn subscribe(&mut self) -> mpsc::UnboundedReceiver<RecorderEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.probe.events.lock().unwrap() = Some(tx);
        rx
    }

    fn completion_source(&self) -> CompletionSource {
        self.completion
    }

    fn name(&self) -> &str {
        "mock recorder"
    }
}

pub struct MockPlayer {
    probe: Probe,
}

impl MockPlayer {
    pub fn new(probe: Probe) -> Self {
        Self { probe }
    }
}

#[async_trait::async_trait]
impl PlayerService for MockPlayer {
    async fn load(&mut self, path: &Path) -> Result<ClipInfo> {
        self.probe.record(format!("load {}", path.display()));
        if self.probe.script().fail_load {
            bail!("no such file");
        }
        Ok(ClipInfo {
            path: path.to_path_buf(),
            duration_seconds: 1.0,
            sample_rate: 22050,
            channels: 1,
        })
    }

    async fn play(&mut self) -> Result<PlaybackDone> {
        self.probe.record("play");
        if self.probe.script().fail_play {
            bail!("audio device unavailable");
        }
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(!self.probe.script().playback_fails);
        Ok(rx)
    }

    fn name(&self) -> &str {
        "mock player"
    }
}

/// `Some(answer)` answers the prompt, `None` makes the request itself fail
pub struct MockPermission(pub Option<bool>);

#[async_trait::async_trait]
impl PermissionService for MockPermission {
    async fn request(&self, _permission: Permission, _rationale: &Rationale) -> Result<bool> {
        match self.0 {
            Some(granted) => Ok(granted),
            None => bail!("permission service unavailable"),
        }
    }
}

pub fn controller_with(
    probe: &Probe,
    completion: CompletionSource,
    permission: Option<bool>,
) -> RecordingSessionController {
    RecordingSessionController::new(
        SessionConfig::new(MEMO_PATH, RecordingOptions::default()),
        Box::new(MockRecorder::new(probe.clone(), completion)),
        Box::new(MockPlayer::new(probe.clone())),
        Box::new(MockPermission(permission)),
    )
}

/// Controller with permission granted and `stop()` as the completion signal
pub fn controller(probe: &Probe) -> RecordingSessionController {
    controller_with(probe, CompletionSource::StopResult, Some(true))
}

pub fn load_call() -> String {
    format!("load {}", MEMO_PATH)
}
