//! ## secretscan-cli
//! **Scanner entrypoint**
//!
//! Walks a directory tree (gitignore-aware, via the same crate ripgrep
//! uses), drives the streaming Detection Engine over each file, and
//! optionally validates every finding against its issuing service.

use clap::Parser;
use secretscan_telemetry::logging::EventLogger;
use secretscan_telemetry::metrics::MetricsRecorder;

mod commands;
mod error;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    EventLogger::init();
    let metrics = MetricsRecorder::new();
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan(scan_args) => commands::run_scan(scan_args, metrics).await?,
    }
    Ok(())
}
