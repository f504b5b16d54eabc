//! # LIRIA CLI (`liria`)
//!
//! Runs the catalog ingest by default; subcommands expose live search,
//! recommendations and provider status.
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `liria` / `liria ingest` | Fetch, normalize, deduplicate, write `data/books.json` |
//! | `liria search "<query>"` | Live search across both catalogs |
//! | `liria recommend "<query>"` | Similarity-ranked recommendations |
//! | `liria sources` | List catalog providers and their status |
//!
//! Logging goes to stderr and honors `RUST_LOG` (default `info`).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use liria::config::{self, DEFAULT_CONFIG_PATH};
use liria::{ingest, recommend, search, sources};

/// LIRIA — book catalog ingestion, search and recommendations.
#[derive(Parser)]
#[command(
    name = "liria",
    version,
    about = "LIRIA — book catalog ingestion, search and recommendations",
    long_about = "Queries OpenLibrary and Google Books, normalizes their records into one \
    shape, deduplicates them, and writes the catalog to a JSON file. Without a command, \
    runs the ingest."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// When the default path does not exist, built-in defaults are used.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Fetch every configured query from all providers and write the catalog.
    ///
    /// The output file is replaced wholesale on each run.
    Ingest,

    /// Search both catalogs live, without touching the catalog file.
    Search {
        /// The search query string.
        query: String,

        /// Maximum number of results to return.
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Recommend books ranked by embedding similarity to the query.
    ///
    /// Falls back to unranked results when no embedding provider is configured.
    Recommend {
        /// What the reader is looking for.
        query: String,

        /// Maximum number of recommendations.
        #[arg(long, default_value_t = 5)]
        limit: usize,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List catalog providers and their status.
    Sources,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let cfg = config::load_config(&cli.config)?;

    match cli.command.unwrap_or(Commands::Ingest) {
        Commands::Ingest => {
            ingest::run_ingest(&cfg).await?;
        }
        Commands::Search { query, limit, json } => {
            search::run_search(&cfg, &query, limit, json).await?;
        }
        Commands::Recommend { query, limit, json } => {
            recommend::run_recommend(&cfg, &query, limit, json).await?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
    }

    Ok(())
}
