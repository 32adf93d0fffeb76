use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use time::OffsetDateTime;
use tracing::info;

use candidate_export::export::{BatchSession, ExportStatus};
use candidate_export::teamtailor::{CandidateSource, PageCursor, TeamtailorClient};
use candidate_export::{observability, output, server, AppError, AppState, ExportConfig, ExportCoordinator};

#[derive(Debug, Parser)]
#[command(name = "candidate-export", version, about = "Export Teamtailor candidates as CSV")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP export API (default)
    Serve,
    /// Download batches to CSV files
    Export {
        /// Resume from a cursor or a previous `links.next` URL
        #[arg(long)]
        cursor: Option<String>,
        /// Keep fetching until the last page
        #[arg(long)]
        all: bool,
        /// Directory for the batch files
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file if present; a missing file is not an error
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound) {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    let cli = Cli::parse();

    let config = match ExportConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e.user_message());
            std::process::exit(2);
        }
    };

    observability::init_tracing_with_level(&config.log_level);
    info!(config = ?config, "Configuration loaded");

    let outcome = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => run_server(&config).await,
        Command::Export { cursor, all, out_dir } => run_export(&config, cursor.as_deref(), all, out_dir).await,
    };

    if let Err(e) = outcome {
        let presentation = e.to_presentation();
        eprintln!("{}: {}", presentation.title, presentation.message);
        if let Some(action) = presentation.action {
            eprintln!("{}", action);
        }
        std::process::exit(1);
    }
}

async fn run_server(config: &ExportConfig) -> Result<(), AppError> {
    let state = AppState::from_config(config)?;
    server::serve(config.socket_addr(), state).await
}

async fn run_export(config: &ExportConfig, cursor: Option<&str>, all: bool, out_dir: PathBuf) -> Result<(), AppError> {
    let client = TeamtailorClient::from_config(config)?;
    let source: Arc<dyn CandidateSource> = Arc::new(client);
    let coordinator = ExportCoordinator::new(source);

    let start = cursor.and_then(PageCursor::from_link);
    let mut session = BatchSession::resume(coordinator, start);

    std::fs::create_dir_all(&out_dir)
        .map_err(|e| AppError::Io(format!("Failed to create {}: {}", out_dir.display(), e)))?;

    let today = OffsetDateTime::now_utc().date();
    let sink = |status: ExportStatus| info!("[CLI] Batch {}", status.as_str());

    while let Some(result) = session.next_batch(&sink).await? {
        let path = output::write_batch(&out_dir, today, session.batches(), &result.csv)?;
        info!("[CLI] Wrote {} candidates to {}", result.record_count, path.display());
        println!("{}", path.display());

        if !all {
            break;
        }
    }

    println!("{}", session.status_line());
    if let Some(next) = session.cursor() {
        println!("Resume with --cursor {}", next);
    }

    Ok(())
}
