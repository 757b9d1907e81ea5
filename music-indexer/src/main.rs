//! music-indexer - audio file ingestion
//!
//! Walks the configured music directories, queues every file durably, and
//! indexes each one (content hash, acoustic fingerprint, tags) into SQLite.
//! An interrupted run resumes from the queue on the next start.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use indexer_common::config::resolve_config_path;
use indexer_common::IndexerConfig;
use music_indexer::services::WorkerState;
use music_indexer::Indexer;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for music-indexer
#[derive(Parser, Debug)]
#[command(name = "music-indexer")]
#[command(about = "Index a music collection into a SQLite track database")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "MUSIC_INDEXER_CONFIG")]
    config: Option<PathBuf>,

    /// Forget failed entries so they are retried by this run
    #[arg(long)]
    retry_failed: bool,

    /// Additional directories to index
    #[arg(value_name = "DIRS")]
    dirs: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    // RUST_LOG wins; otherwise the configured level replaces this default once loaded
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting music-indexer v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Build: {} ({}, {})",
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config_path = resolve_config_path(args.config.as_deref(), "MUSIC_INDEXER_CONFIG");
    let mut config =
        IndexerConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    if !from_env {
        let level = EnvFilter::try_new(&config.logging.level)
            .with_context(|| format!("Invalid logging.level '{}'", config.logging.level))?;
        filter_handle
            .reload(level)
            .context("Failed to apply logging level")?;
    }

    config.dirs.extend(args.dirs);
    if config.dirs.is_empty() {
        warn!("No directories configured; only pending entries will be processed");
    }

    info!("Queue database: {}", config.queue_db.display());
    info!("Index database: {}", config.index_db.display());

    let indexer = Indexer::open(&config)
        .await
        .context("Failed to open databases")?;

    if args.retry_failed {
        let reset = indexer
            .queue
            .reset_failed()
            .await
            .context("Failed to reset failed entries")?;
        info!(reset, "Failed entries will be retried");
    }

    let report = tokio::select! {
        report = indexer.run(&config.dirs) => report.context("Indexing aborted")?,
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, stopping; unfinished entries stay pending");
            return Ok(ExitCode::SUCCESS);
        }
    };

    let counts = indexer.queue.counts().await.context("Failed to read queue counts")?;
    info!(
        processed = report.stats.processed,
        succeeded = report.stats.succeeded,
        failed = report.stats.failed,
        deduplicated = report.stats.deduplicated,
        fingerprint_absent = report.stats.fingerprint_absent,
        "Run complete"
    );
    info!(
        pending = counts.pending,
        succeeded = counts.succeeded,
        failed = counts.failed,
        "Queue totals"
    );

    if report.state == WorkerState::Faulted {
        error!(
            error = indexer.worker.last_error().as_deref().unwrap_or("unknown"),
            "Queue store failure, exiting"
        );
        return Ok(ExitCode::FAILURE);
    }

    Ok(ExitCode::SUCCESS)
}
