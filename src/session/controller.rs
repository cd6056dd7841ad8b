use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use super::config::SessionConfig;
use super::outcome::{Intent, Outcome, SessionError};
use super::state::{
    FinalizedRecording, PermissionState, Phase, RecordingFinalized, RecordingSession,
    SessionSnapshot, ViewState,
};
use crate::audio::{
    CompletionSource, Permission, PermissionService, PlayerService, Rationale, RecorderEvent,
    RecorderService,
};

/// Drives one recording session: validates intents against the current phase
/// and forwards them to the recorder and player services.
///
/// All operations take `&mut self`, so intents on one controller are applied
/// one at a time. Use [`SessionHandle`](super::SessionHandle) to share a
/// controller between several callers.
pub struct RecordingSessionController {
    config: SessionConfig,
    session: RecordingSession,
    recorder: Box<dyn RecorderService>,
    player: Box<dyn PlayerService>,
    permissions: Box<dyn PermissionService>,
    events: Option<mpsc::UnboundedReceiver<RecorderEvent>>,
    state: watch::Sender<SessionSnapshot>,
}

impl RecordingSessionController {
    pub fn new(
        config: SessionConfig,
        recorder: Box<dyn RecorderService>,
        player: Box<dyn PlayerService>,
        permissions: Box<dyn PermissionService>,
    ) -> Self {
        let session = RecordingSession::new(config.audio_file_path.clone());

        info!(
            "Creating recording session: {} (recorder: {}, player: {})",
            session.session_id,
            recorder.name(),
            player.name()
        );

        let (state, _) = watch::channel(session.snapshot());

        Self {
            config,
            session,
            recorder,
            player,
            permissions,
            events: None,
            state,
        }
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn session(&self) -> &RecordingSession {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn view_state(&self) -> ViewState {
        ViewState::from(&self.session.snapshot())
    }

    /// Receiver notified whenever the session changes, including mid-operation
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Apply an intent by name
    pub async fn apply(&mut self, intent: Intent) -> Outcome {
        match intent {
            Intent::Initialize => self.initialize().await,
            Intent::Record => self.record().await,
            Intent::Pause => self.pause().await,
            Intent::Stop => self.stop().await,
            Intent::Play => self.play().await,
        }
    }

    /// Resolve microphone permission and, when granted, prepare the first take
    pub async fn initialize(&mut self) -> Outcome {
        let phase = self.session.phase;

        if self.session.permission != PermissionState::Unknown {
            warn!("Session {} is already initialized", self.session.session_id);
            return Outcome::rejected(
                Intent::Initialize,
                phase,
                SessionError::InvalidTransition {
                    intent: Intent::Initialize,
                    phase,
                },
            );
        }

        let rationale = Rationale::microphone(&self.config.app_name);
        let granted = match self
            .permissions
            .request(Permission::RecordAudio, &rationale)
            .await
        {
            Ok(granted) => granted,
            Err(e) => {
                error!("Permission request failed: {:#}", e);
                false
            }
        };

        if !granted {
            self.session.permission = PermissionState::Denied;
            self.publish();
            warn!("Microphone permission denied, recording is disabled for this session");
            return Outcome::rejected(Intent::Initialize, phase, SessionError::PermissionDenied);
        }

        self.session.permission = PermissionState::Granted;
        self.publish();
        self.events = Some(self.recorder.subscribe());

        if let Err(e) = self.prepare() {
            return Outcome::failed(Intent::Initialize, phase, phase, e);
        }

        info!("Session {} ready", self.session.session_id);
        Outcome::applied(Intent::Initialize, phase, phase)
    }

    /// Start a new take, or resume a paused one
    pub async fn record(&mut self) -> Outcome {
        self.drain_events();
        let from = self.session.phase;

        if from == Phase::Recording {
            warn!("Already recording!");
            return Outcome::rejected(
                Intent::Record,
                from,
                SessionError::InvalidTransition {
                    intent: Intent::Record,
                    phase: from,
                },
            );
        }

        if self.session.permission != PermissionState::Granted {
            warn!("Can't record, no permission granted!");
            return Outcome::rejected(Intent::Record, from, SessionError::PermissionDenied);
        }

        if from == Phase::Stopped {
            if let Err(e) = self.prepare() {
                return Outcome::failed(Intent::Record, from, from, e);
            }
        }

        self.set_phase(Phase::Recording);

        match self.recorder.start().await {
            Ok(()) => {
                info!("Recording to {}", self.session.audio_file_path.display());
                Outcome::applied(Intent::Record, from, Phase::Recording)
            }
            Err(e) => {
                error!("Failed to start recording: {:#}", e);
                Outcome::failed(
                    Intent::Record,
                    from,
                    Phase::Recording,
                    SessionError::service("recorder start", &e),
                )
            }
        }
    }

    pub async fn pause(&mut self) -> Outcome {
        self.drain_events();
        let from = self.session.phase;

        if from != Phase::Recording {
            warn!("Can't pause, not recording!");
            return Outcome::rejected(
                Intent::Pause,
                from,
                SessionError::InvalidTransition {
                    intent: Intent::Pause,
                    phase: from,
                },
            );
        }

        match self.recorder.pause().await {
            Ok(()) => {
                self.set_phase(Phase::Paused);
                Outcome::applied(Intent::Pause, from, Phase::Paused)
            }
            Err(e) => {
                error!("Failed to pause recording: {:#}", e);
                Outcome::failed(
                    Intent::Pause,
                    from,
                    from,
                    SessionError::service("recorder pause", &e),
                )
            }
        }
    }

    /// Stop the current take
    ///
    /// The phase becomes `Stopped` before the recorder confirms the stop.
    pub async fn stop(&mut self) -> Outcome {
        self.drain_events();
        let from = self.session.phase;

        if !from.is_active() {
            warn!("Can't stop, not recording!");
            return Outcome::rejected(
                Intent::Stop,
                from,
                SessionError::InvalidTransition {
                    intent: Intent::Stop,
                    phase: from,
                },
            );
        }

        self.set_phase(Phase::Stopped);

        let result = self.recorder.stop().await;
        let source = self.recorder.completion_source();

        // Progress reported while the recorder was stopping counts toward the take
        self.drain_events();

        let outcome = match result {
            Ok(path) => {
                if source == CompletionSource::StopResult {
                    self.finalize(RecordingFinalized {
                        succeeded: true,
                        path,
                        source,
                    });
                }
                Outcome::applied(Intent::Stop, from, Phase::Stopped)
            }
            Err(e) => {
                error!("Failed to stop recording: {:#}", e);
                Outcome::failed(
                    Intent::Stop,
                    from,
                    Phase::Stopped,
                    SessionError::service("recorder stop", &e),
                )
            }
        };

        outcome
    }

    /// Play back the most recent take, stopping an active recording first
    pub async fn play(&mut self) -> Outcome {
        self.drain_events();
        let from = self.session.phase;

        if from == Phase::Idle {
            warn!("Can't play, nothing has been recorded yet!");
            return Outcome::rejected(
                Intent::Play,
                from,
                SessionError::InvalidTransition {
                    intent: Intent::Play,
                    phase: from,
                },
            );
        }

        let mut stop_error = None;
        if from.is_active() {
            stop_error = self.stop().await.error;
        }
        let phase = self.session.phase;

        let path = self.session.audio_file_path.clone();
        match self.player.load(&path).await {
            Ok(clip) => info!(
                "Loaded {} ({:.1}s, {}Hz, {} channels)",
                clip.path.display(),
                clip.duration_seconds,
                clip.sample_rate,
                clip.channels
            ),
            Err(e) => {
                error!("Sound loading has failed: {:#}", e);
                return Outcome::failed(
                    Intent::Play,
                    from,
                    phase,
                    SessionError::LoadFailure {
                        path,
                        message: format!("{:#}", e),
                    },
                );
            }
        }

        let done = match self.player.play().await {
            Ok(done) => done,
            Err(e) => {
                error!("Playback failed to start: {:#}", e);
                return Outcome::failed(
                    Intent::Play,
                    from,
                    phase,
                    SessionError::PlaybackFailure {
                        message: format!("{:#}", e),
                    },
                );
            }
        };

        // Playback is not part of the phase; its completion is only logged
        tokio::spawn(async move {
            match done.await {
                Ok(true) => info!("Played successfully"),
                Ok(false) => error!(
                    "{}",
                    SessionError::PlaybackFailure {
                        message: "decoding errors".to_string()
                    }
                ),
                Err(_) => debug!("Playback was interrupted"),
            }
        });

        match stop_error {
            Some(error) => Outcome::failed(Intent::Play, from, phase, error),
            None => Outcome::applied(Intent::Play, from, phase),
        }
    }

    /// Terminal bookkeeping for a confirmed stop, whichever way it was reported
    pub fn finalize(&mut self, event: RecordingFinalized) -> FinalizedRecording {
        let record = FinalizedRecording {
            succeeded: event.succeeded,
            path: event.path,
            duration_secs: self.session.elapsed_seconds,
            source: event.source,
            finalized_at: Utc::now(),
        };

        if record.succeeded {
            info!(
                "Finished recording duration {} seconds at path: {}",
                record.duration_secs,
                record.path.display()
            );
        } else {
            warn!(
                "Recording did not finish cleanly after {} seconds at path: {}",
                record.duration_secs,
                record.path.display()
            );
        }

        self.session.last_finalized = Some(record.clone());
        self.publish();
        record
    }

    /// Apply a progress or finished notification from the recorder
    pub fn handle_event(&mut self, event: RecorderEvent) {
        match event {
            RecorderEvent::Progress { current_time } => {
                self.session.elapsed_seconds = current_time.max(0.0).floor() as u64;
                self.publish();
            }
            RecorderEvent::Finished { succeeded, path } => {
                let source = self.recorder.completion_source();
                if source == CompletionSource::FinishedEvent {
                    self.finalize(RecordingFinalized {
                        succeeded,
                        path,
                        source,
                    });
                } else {
                    debug!("Ignoring finished event, completion comes from stop()");
                }
            }
        }
    }

    /// Apply every queued recorder notification without waiting
    pub fn drain_events(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(rx) = self.events.as_mut() {
            while let Ok(event) = rx.try_recv() {
                pending.push(event);
            }
        }

        let count = pending.len();
        for event in pending {
            self.handle_event(event);
        }
        count
    }

    /// Wait for the next recorder notification
    ///
    /// Never resolves before `initialize()` subscribed, or after the recorder
    /// dropped its end of the channel.
    pub async fn next_event(&mut self) -> Option<RecorderEvent> {
        if let Some(rx) = self.events.as_mut() {
            if let Some(event) = rx.recv().await {
                return Some(event);
            }
            self.events = None;
        }
        std::future::pending().await
    }

    fn set_phase(&mut self, phase: Phase) {
        debug!("Phase {} -> {}", self.session.phase, phase);
        self.session.phase = phase;
        self.publish();
    }

    fn publish(&self) {
        self.state.send_replace(self.session.snapshot());
    }

    fn prepare(&mut self) -> Result<(), SessionError> {
        self.session.elapsed_seconds = 0;
        self.publish();

        self.recorder
            .configure(&self.session.audio_file_path, &self.config.options)
            .map_err(|e| {
                error!("Failed to prepare recording: {:#}", e);
                SessionError::service("recorder configure", &e)
            })
    }
}
