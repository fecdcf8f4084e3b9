//! Command-line entry point for trendrag.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::rag::{Embedder, Indexer, OllamaEmbedder, TrendAssistant};
use crate::scheduler::{self, Scheduler};
use crate::scraping::ScrapingService;
use crate::server::{self, AppState};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Trending-topics scraper with retrieval-augmented answering.
#[derive(Debug, Parser)]
#[command(name = "trendrag", version)]
#[command(about = "Scrape trending listings and answer questions about them", long_about = None)]
pub struct Cli {
    /// JSON config file; defaults apply to anything it omits.
    #[arg(long, global = true, env = "TRENDRAG_CONFIG")]
    pub config: Option<PathBuf>,
    /// Operation to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level operations.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch all listing pages into the staging file, then index them.
    Scrape,
    /// Open the index, building it from the staging file if none exists.
    Index,
    /// Rebuild the index from the staging file.
    Refresh,
    /// Answer a question from the index.
    Ask {
        /// Question text.
        question: String,
    },
    /// Scrape at minute 0 and 30 of every hour until Ctrl+C.
    Schedule,
    /// Serve the HTTP API until Ctrl+C.
    Serve {
        /// Listening port; overrides config and environment.
        #[arg(long)]
        port: Option<u16>,
    },
}

/// Parse arguments, run the chosen operation and report the outcome.
///
/// # Returns
/// `ExitCode::SUCCESS` on success, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting trendrag v{}", env!("CARGO_PKG_VERSION"));

    let config = match AppConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(dispatch(cli.command, config)) {
        tracing::error!("{e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

async fn dispatch(command: Command, config: AppConfig) -> Result<(), BoxError> {
    match command {
        Command::Scrape => {
            let indexer = build_indexer(&config)?;
            let scraper = ScrapingService::new(config.scraping)?;
            let report = scheduler::scrape_and_index(&scraper, &indexer).await?;
            tracing::info!("Scrape finished: {report:?}");
        }
        Command::Index => match build_indexer(&config)?.ensure_index().await? {
            Some(index) => {
                tracing::info!(
                    "Index at {} holds {} documents",
                    index.dir().display(),
                    index.len().await?
                );
                index.close().await?;
            }
            None => tracing::warn!("No index built: nothing staged"),
        },
        Command::Refresh => match build_indexer(&config)?.refresh().await? {
            Some(index) => {
                tracing::info!("Index refreshed with {} documents", index.len().await?);
                index.close().await?;
            }
            None => tracing::warn!("No index built: nothing staged"),
        },
        Command::Ask { question } => {
            let assistant = TrendAssistant::from_config(&config.rag)?;
            let answer = assistant.ask(&question).await?;
            print_answer(&answer);
        }
        Command::Schedule => {
            let indexer = build_indexer(&config)?;
            let scheduler = Scheduler::new(ScrapingService::new(config.scraping)?, indexer);
            scheduler.run_until(shutdown_signal()).await;
        }
        Command::Serve { port } => {
            let state = AppState::from_config(&config.rag)?;
            let port = port.unwrap_or(config.server.port);
            server::run_server_with_shutdown(state, port, shutdown_signal()).await?;
        }
    }
    Ok(())
}

fn build_indexer(config: &AppConfig) -> Result<Indexer, BoxError> {
    let embedder: Arc<dyn Embedder> = Arc::new(OllamaEmbedder::new(&config.rag.embedding)?);
    Ok(Indexer::new(config.rag.storage.clone(), embedder))
}

#[allow(clippy::print_stdout)]
fn print_answer(answer: &str) {
    println!("{answer}");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
