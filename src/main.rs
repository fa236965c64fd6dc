use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use magic_ink::error::ErrorCode;
use magic_ink::generation::config::ConfigError;
use magic_ink::generation::{
    FileSnapshot, GenerationConfig, GenerationError, HttpTransport, Orchestrator, PlayReport, Scope, TransportError,
};
use magic_ink::session::{Document, Session, SessionError};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("transport setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("{}", .0.user_message())]
    Generation(#[from] GenerationError),
    #[error("--play needs --snapshot <png>")]
    MissingSnapshot,
    #[error("failed to encode document: {0}")]
    Json(#[from] serde_json::Error),
}

impl CliError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Generation(e) => e.error_code(),
            Self::Transport(e) => e.error_code(),
            Self::Session(_) => "E_SESSION",
            Self::Config(_) => "E_CONFIG",
            Self::MissingSnapshot => "E_MISSING_SNAPSHOT",
            Self::Json(_) => "E_JSON",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "magic-ink", about = "Replay magic-ink canvas sessions and run generations")]
struct Cli {
    /// Default log filter when `RUST_LOG` is unset.
    #[arg(long, env = "MAGIC_INK_LOG", default_value = "info")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a recorded session and print the resulting document as JSON.
    Replay(ReplayCommand),
}

#[derive(Args, Debug)]
struct ReplayCommand {
    #[arg(long)]
    session: PathBuf,

    /// PNG used as the canvas snapshot for `--play`.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Send the replayed magic ink to the generation service.
    #[arg(long)]
    play: bool,

    /// Generate against one card in edit mode instead of the visible canvas.
    #[arg(long, requires = "play")]
    card: Option<Uuid>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(&cli.log);
    if let Err(e) = dotenv {
        debug!(error = %e, "cli: no .env loaded");
    }

    let result = match cli.command {
        Command::Replay(replay) => run_replay(replay).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error [{}]: {e}", e.error_code());
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_replay(cmd: ReplayCommand) -> Result<(), CliError> {
    let session = Session::load(&cmd.session)?;
    let core = session.replay();

    let core = if cmd.play {
        let snapshot = cmd.snapshot.ok_or(CliError::MissingSnapshot)?;
        let config = GenerationConfig::from_env()?;
        let transport = HttpTransport::new(&config)?;
        info!(endpoint = transport.endpoint(), snapshot = %snapshot.display(), "cli: generating");

        let orchestrator = Orchestrator::new(Arc::new(transport), Arc::new(FileSnapshot::new(snapshot)))
            .with_snapshot_timeout(config.timeouts.snapshot());
        let scope = cmd.card.map_or(Scope::Canvas, Scope::Card);
        let engine = tokio::sync::Mutex::new(core);
        let report = orchestrator.play(&engine, scope).await?;
        log_report(&report);
        engine.into_inner()
    } else {
        core
    };

    let document = Document::from_engine(&core);
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

fn log_report(report: &PlayReport) {
    for skipped in &report.skipped {
        warn!(index = skipped.index, code = skipped.error.error_code(), error = %skipped.error, "cli: action skipped");
    }
    info!(
        generation_id = report.generation_id.as_deref().unwrap_or("-"),
        placed = report.placed,
        modified = report.modified,
        deleted = report.deleted,
        missing = report.missing.len(),
        magic_cleared = report.magic_cleared,
        "cli: generation applied"
    );
}
