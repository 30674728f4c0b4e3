//! # devdoc CLI
//!
//! Ingests a project's source code and best-practice documents into
//! per-corpus vector stores, then answers documentation and review requests
//! from the command line or over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! devdoc --config ./config/devdoc.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `devdoc ingest code` | Rebuild the code corpus from a source tree |
//! | `devdoc ingest practices` | Rebuild the practices corpus for a language |
//! | `devdoc serve` | Start the HTTP server |
//! | `devdoc document [FILE]` | Generate a docstring (reads stdin without FILE) |
//! | `devdoc review [FILE]` | Review code (reads stdin without FILE) |
//! | `devdoc stats` | Show what each corpus holds |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use dev_documento::{assist, config, ingest, server, stats};

/// devdoc: docstrings and code reviews grounded in your own codebase.
///
/// Every command accepts `--config` pointing to a TOML file. Without it,
/// built-in defaults are used. See `config/devdoc.example.toml`.
#[derive(Parser)]
#[command(name = "devdoc", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a corpus from local files.
    ///
    /// Each run replaces the corpus wholesale; nothing is written when no
    /// document could be loaded.
    Ingest {
        #[command(subcommand)]
        target: IngestTarget,
    },

    /// Start the HTTP server.
    Serve {
        /// Bind address, overriding `[server].bind`.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Generate a docstring for a code snippet.
    Document {
        /// File holding the snippet. Reads stdin when omitted.
        file: Option<PathBuf>,
    },

    /// Review a code snippet against the codebase and best practices.
    Review {
        /// File holding the snippet. Reads stdin when omitted.
        file: Option<PathBuf>,
    },

    /// Show per-corpus record counts, embedder, and ingestion time.
    Stats,
}

#[derive(Subcommand)]
enum IngestTarget {
    /// Ingest a project source tree into the code corpus.
    Code {
        /// Project root, overriding `[ingest.code].path`.
        #[arg(long)]
        path: Option<PathBuf>,

        /// Accepted file extension (repeatable), e.g. `--ext .py`.
        #[arg(long = "ext")]
        extensions: Vec<String>,

        /// Directory name to skip (repeatable), e.g. `--ignore build`.
        #[arg(long = "ignore")]
        ignore_dirs: Vec<String>,
    },

    /// Ingest best-practice documents into the practices corpus.
    Practices {
        /// Language subdirectory under `[ingest.practices].root`.
        #[arg(long)]
        language: Option<String>,

        /// Explicit directory, overriding root and language.
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::Config::default(),
    };

    match cli.command {
        Commands::Ingest { target } => match target {
            IngestTarget::Code {
                path,
                extensions,
                ignore_dirs,
            } => {
                ingest::run_ingest_code(&cfg, path, extensions, ignore_dirs).await?;
            }
            IngestTarget::Practices { language, path } => {
                ingest::run_ingest_practices(&cfg, language, path).await?;
            }
        },
        Commands::Serve { bind } => {
            server::run_server(&cfg, bind.as_deref()).await?;
        }
        Commands::Document { file } => {
            assist::run_document(&cfg, file.as_deref()).await?;
        }
        Commands::Review { file } => {
            assist::run_review(&cfg, file.as_deref()).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
