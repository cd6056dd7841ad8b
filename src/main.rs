use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;
use voice_memo::audio::{MeterSink, StaticPermission};
use voice_memo::{
    create_router, AppState, Config, FilePlayer, Intent, RecordingSessionController,
    SessionHandle, ToneSource, WavRecorder,
};

#[derive(Parser)]
#[command(name = "voice-memo", version, about = "Record and play back a short voice memo")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/voice-memo")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drive the session from stdin: record, pause, stop, play, status, quit
    Console,
    /// Serve the HTTP control API
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    let controller = build_controller(&cfg)?;
    let (session, task) = SessionHandle::spawn(controller);

    let outcome = session.initialize().await?;
    if let Some(error) = &outcome.error {
        info!("Session initialized with: {}", error);
    }

    match cli.command {
        Command::Console => run_console(&session).await?,
        Command::Serve => serve(&cfg, session.clone()).await?,
    }

    session.shutdown().await?;
    task.await.context("Session task panicked")?;

    Ok(())
}

fn build_controller(cfg: &Config) -> Result<RecordingSessionController> {
    let session_config = cfg.session_config()?;
    info!("Recording to {}", session_config.audio_file_path.display());

    let recorder = WavRecorder::new(ToneSource::new(cfg.tone_config()), cfg.recorder_config());
    let player = FilePlayer::new(MeterSink, cfg.player_config());
    let permissions = StaticPermission::new(cfg.platform.microphone);

    Ok(RecordingSessionController::new(
        session_config,
        Box::new(recorder),
        Box::new(player),
        Box::new(permissions),
    ))
}

async fn run_console(session: &SessionHandle) -> Result<()> {
    println!("Commands: record | pause | stop | play | status | quit");
    println!("{}", session.view());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let intent = match line.trim().to_ascii_lowercase().as_str() {
            "" => continue,
            "record" | "r" => Intent::Record,
            "pause" | "p" => Intent::Pause,
            "stop" | "s" => Intent::Stop,
            "play" | "l" => Intent::Play,
            "status" | "?" => {
                println!("{}", serde_json::to_string_pretty(&session.snapshot())?);
                continue;
            }
            "quit" | "q" | "exit" => break,
            other => {
                println!("Unknown command: {}", other);
                continue;
            }
        };

        let outcome = session.apply(intent).await?;
        match &outcome.error {
            Some(error) => println!("{} → {} ({})", intent, outcome.to, error),
            None => println!("{} → {}", intent, outcome.to),
        }
        println!("{}", session.view());
    }

    Ok(())
}

async fn serve(cfg: &Config, session: SessionHandle) -> Result<()> {
    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, create_router(AppState::new(session)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutting down");
        })
        .await
        .context("HTTP server failed")
}
