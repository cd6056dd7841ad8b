use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::controller::RecordingSessionController;
use super::outcome::{Intent, Outcome};
use super::state::{SessionSnapshot, ViewState};

enum Command {
    Apply(Intent, oneshot::Sender<Outcome>),
    Shutdown,
}

/// Shared front door to a controller running on its own task
///
/// Intents from every clone go through one queue and are applied strictly in
/// arrival order, so an intent never observes another one half-way through
/// its service call. Recorder events are applied between intents.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<SessionSnapshot>,
}

impl SessionHandle {
    /// Move `controller` onto a task. The join handle yields it back after shutdown.
    pub fn spawn(
        mut controller: RecordingSessionController,
    ) -> (Self, JoinHandle<RecordingSessionController>) {
        let (command_tx, mut command_rx) = mpsc::channel::<Command>(32);
        let state_rx = controller.subscribe();

        let task = tokio::spawn(async move {
            debug!("Session task started");

            loop {
                tokio::select! {
                    command = command_rx.recv() => match command {
                        Some(Command::Apply(intent, reply)) => {
                            let outcome = controller.apply(intent).await;
                            // The caller may have given up waiting
                            let _ = reply.send(outcome);
                        }
                        Some(Command::Shutdown) | None => break,
                    },
                    Some(event) = controller.next_event() => {
                        controller.handle_event(event);
                    }
                }
            }

            info!("Session task stopped");
            controller
        });

        (
            Self {
                commands: command_tx,
                state: state_rx,
            },
            task,
        )
    }

    /// Queue an intent and wait for its outcome
    pub async fn apply(&self, intent: Intent) -> Result<Outcome> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Apply(intent, reply_tx))
            .await
            .ok()
            .context("Session task is not running")?;

        reply_rx.await.context("Session task dropped the intent")
    }

    pub async fn initialize(&self) -> Result<Outcome> {
        self.apply(Intent::Initialize).await
    }

    pub async fn record(&self) -> Result<Outcome> {
        self.apply(Intent::Record).await
    }

    pub async fn pause(&self) -> Result<Outcome> {
        self.apply(Intent::Pause).await
    }

    pub async fn stop(&self) -> Result<Outcome> {
        self.apply(Intent::Stop).await
    }

    pub async fn play(&self) -> Result<Outcome> {
        self.apply(Intent::Play).await
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn view(&self) -> ViewState {
        ViewState::from(&*self.state.borrow())
    }

    /// Receiver that is notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// Stop the session task after the intents already queued
    pub async fn shutdown(&self) -> Result<()> {
        self.commands
            .send(Command::Shutdown)
            .await
            .ok()
            .context("Session task is not running")
    }
}
