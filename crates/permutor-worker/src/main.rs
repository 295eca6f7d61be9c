//! permutor - durable-queue permutation worker.
//!
//! Long-running service: no user-facing commands beyond start and stop
//! signals. Reads its configuration from a JSON file, logs to the console
//! via `tracing` (filterable with `RUST_LOG`), and shuts down cooperatively
//! on SIGINT/SIGTERM - an in-flight candidate always completes first.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use permutor_queue::SqliteQueue;
use permutor_worker::{LogReporter, Worker, WorkerConfig};

/// permutor - expands queued byte-sequence candidates into rearrangements
#[derive(Parser, Debug)]
#[command(name = "permutor")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the JSON configuration file (defaults apply if absent)
    #[arg(short, long, default_value = "permutor.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = WorkerConfig::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;

    let queue = SqliteQueue::open(&config.db_path)
        .with_context(|| format!("opening queue database {}", config.db_path.display()))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let mut sigint = signal(SignalKind::interrupt()).expect("install SIGINT handler");
        let mut sigterm = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = sigint.recv() => info!("SIGINT received, shutting down"),
            _ = sigterm.recv() => info!("SIGTERM received, shutting down"),
        }
        let _ = shutdown_tx.send(true);
    });

    let mut worker = Worker::new(Arc::new(queue), LogReporter::new(), config);
    worker.run(shutdown_rx).await?;

    info!(
        processed = worker.progress().processed,
        emitted = worker.progress().emitted,
        "worker stopped"
    );
    Ok(())
}
