// Integration tests for the session task
//
// Intents from several callers must be applied one at a time, and recorder
// events must reach the published view state without any intent.

mod common;

use common::{controller, controller_with, Probe, MEMO_PATH};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::oneshot;
use voice_memo::audio::{CompletionSource, RecorderEvent};
use voice_memo::session::PermissionState;
use voice_memo::{Phase, SessionHandle};

#[tokio::test]
async fn test_handle_applies_intents_and_publishes_state() -> anyhow::Result<()> {
    let probe = Probe::default();
    let (session, task) = SessionHandle::spawn(controller(&probe));

    session.initialize().await?;
    assert_eq!(session.snapshot().permission, PermissionState::Granted);

    let outcome = session.record().await?;
    assert!(outcome.is_ok());
    assert!(session.view().recording);

    session.pause().await?;
    let view = session.view();
    assert!(view.paused && !view.recording);

    session.stop().await?;
    assert_eq!(session.snapshot().phase, Phase::Stopped);

    session.shutdown().await?;
    let controller = task.await?;
    assert_eq!(controller.phase(), Phase::Stopped);

    Ok(())
}

#[tokio::test]
async fn test_progress_events_update_view_between_intents() -> anyhow::Result<()> {
    let probe = Probe::default();
    let (session, _task) = SessionHandle::spawn(controller(&probe));
    session.initialize().await?;
    session.record().await?;

    let mut state = session.subscribe();
    probe.emit(RecorderEvent::Progress { current_time: 4.5 });

    tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|snapshot| snapshot.elapsed_seconds == 4),
    )
    .await??;
    assert_eq!(session.view().current_time, 4);

    Ok(())
}

#[tokio::test]
async fn test_finished_event_after_stop_finalizes_take() -> anyhow::Result<()> {
    let probe = Probe::default();
    let controller = controller_with(&probe, CompletionSource::FinishedEvent, Some(true));
    let (session, _task) = SessionHandle::spawn(controller);
    session.initialize().await?;
    session.record().await?;
    probe.emit(RecorderEvent::Progress { current_time: 3.2 });

    probe.script().defer_finished = true;
    let outcome = session.stop().await?;
    assert!(outcome.is_ok());
    assert!(session.snapshot().last_finalized.is_none());

    let mut state = session.subscribe();
    probe.emit(RecorderEvent::Finished {
        succeeded: true,
        path: PathBuf::from(MEMO_PATH),
    });

    let snapshot = tokio::time::timeout(
        Duration::from_secs(5),
        state.wait_for(|snapshot| snapshot.last_finalized.is_some()),
    )
    .await??
    .clone();

    let finalized = snapshot.last_finalized.unwrap();
    assert!(finalized.succeeded);
    assert_eq!(finalized.duration_secs, 3);
    assert_eq!(finalized.source, CompletionSource::FinishedEvent);
    assert_eq!(snapshot.phase, Phase::Stopped);

    Ok(())
}

#[tokio::test]
async fn test_concurrent_intents_are_serialized() -> anyhow::Result<()> {
    let probe = Probe::default();
    let (session, _task) = SessionHandle::spawn(controller(&probe));
    session.initialize().await?;
    session.record().await?;

    // Hold the stop inside the recorder while a record arrives
    let (release, gate) = oneshot::channel();
    probe.script().stop_gate = Some(gate);

    let stopper = session.clone();
    let stop = tokio::spawn(async move { stopper.stop().await });
    let mut state = session.subscribe();
    state.wait_for(|snapshot| snapshot.phase == Phase::Stopped).await?;

    let recorder = session.clone();
    let record = tokio::spawn(async move { recorder.record().await });
    tokio::task::yield_now().await;
    assert_eq!(probe.count("configure"), 1, "Record must wait for the stop");

    release.send(()).ok();
    let stop = stop.await??;
    let record = record.await??;

    assert!(stop.is_ok());
    assert_eq!(record.from, Phase::Stopped, "Record observed the finished stop");
    assert_eq!(record.to, Phase::Recording);
    assert_eq!(
        probe.calls(),
        vec![
            "configure",
            "start",
            "stop",
            "stop resolved",
            "configure",
            "start"
        ]
    );

    Ok(())
}

#[tokio::test]
async fn test_apply_after_shutdown_fails() -> anyhow::Result<()> {
    let probe = Probe::default();
    let (session, task) = SessionHandle::spawn(controller(&probe));

    session.shutdown().await?;
    task.await?;

    assert!(session.record().await.is_err());

    Ok(())
}
