//! Headless host bridge binary for stdin/stdout JSON communication.
//!
//! This binary reads alarm requests as newline-delimited JSON (or plain
//! alarm text) from stdin, schedules them, and writes responses and
//! `alarm.fired` events to stdout.
//!
//! All tracing/diagnostic output goes to stderr so that stdout remains a
//! clean JSON protocol channel.

use chime::ChimeConfig;
use chime::host::run_stdio_bridge;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Natural-language alarm host speaking JSON lines on stdio.
#[derive(Debug, Parser)]
#[command(name = "chime-host", version, about)]
struct Cli {
    /// Config file (defaults to ~/.config/chime/config.toml when present).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the scheduler tick interval in milliseconds.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    tick_ms: Option<u64>,
}

fn load_config(cli: &Cli) -> anyhow::Result<ChimeConfig> {
    let mut config = match &cli.config {
        Some(path) => ChimeConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))?,
        None => {
            let path = ChimeConfig::default_config_path();
            if path.exists() {
                ChimeConfig::from_file(&path)
                    .map_err(|e| anyhow::anyhow!("failed to load {}: {e}", path.display()))?
            } else {
                ChimeConfig::default()
            }
        }
    };
    if let Some(tick_ms) = cli.tick_ms {
        config.scheduler.tick_interval_ms = tick_ms;
    }
    config.validate()?;
    Ok(config)
}

/// Initialise tracing to stderr (stdout is reserved for the JSON protocol),
/// plus a daily rolling file when a log directory is configured.
fn init_tracing(config: &ChimeConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.filter))
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter());

    match &config.logging.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "chime-host.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(filter());
            tracing_subscriber::registry()
                .with(stderr_layer)
                .with(file_layer)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(stderr_layer).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let _guard = init_tracing(&config);

    tracing::info!(
        tick_ms = config.scheduler.tick_interval_ms,
        matching = ?config.interpreter.matching,
        "chime-host starting"
    );

    run_stdio_bridge(&config).await.map_err(|e| {
        tracing::error!(error = %e, "chime-host exited with error");
        anyhow::anyhow!("chime-host failed: {e}")
    })?;

    tracing::info!("chime-host shut down cleanly");
    Ok(())
}
