use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use ignore::WalkBuilder;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};

use secretscan_config::ScanConfig;
use secretscan_core::cancel::CancellationToken;
use secretscan_core::detect::engine::DetectionEngine;
use secretscan_core::secret::ValidationStatus;
use secretscan_detectors::{build_detectors, build_validation_engine};
use secretscan_telemetry::metrics::MetricsRecorder;

use crate::error::CliError;

#[derive(Parser)]
#[command(version, about = "Scans a file tree for credentials and optionally validates them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Walk a directory (or scan a single file) for secrets.
    Scan(ScanArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ScanArgs {
    /// File or directory to scan.
    pub path: PathBuf,

    /// Optional config file (YAML); falls back to `secretscan_config::ScanConfig`'s
    /// default search path and environment overrides when omitted.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Validate every detected secret against its issuing service.
    #[arg(long)]
    pub validate: bool,
}

#[derive(Debug, Serialize)]
pub struct ScanFinding {
    pub path: String,
    pub kind: String,
    pub absolute_start: usize,
    pub status: Option<String>,
}

#[instrument(level = "info", name = "run_scan", skip(metrics))]
pub async fn run_scan(args: ScanArgs, metrics: MetricsRecorder) -> Result<(), CliError> {
    let config = match &args.config {
        Some(path) => ScanConfig::load_from_path(path)?,
        None => ScanConfig::load()?,
    };

    let detector_config = config.clone();
    let cancel = CancellationToken::new();

    let files = collect_files(&args.path)?;
    let mut findings = Vec::new();

    for path in files {
        let path_display = path.display().to_string();
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(err) => {
                warn!(path = %path_display, error = %err, "skipping unreadable file");
                continue;
            }
        };

        let detectors = build_detectors(&detector_config).map_err(CliError::Registry)?;
        let engine = match DetectionEngine::new(
            BufReader::new(file),
            detectors,
            detector_config.engine.read_len,
            detector_config.engine.retain_len,
        ) {
            Ok(engine) => engine,
            Err(err) => {
                error!(path = %path_display, error = %err, "failed to construct detection engine");
                continue;
            }
        };

        let emissions = match engine.run(&cancel) {
            Ok(emissions) => emissions,
            Err(err) => {
                warn!(path = %path_display, error = %err, "detection stopped early");
                continue;
            }
        };

        for emission in emissions {
            metrics.inc_secrets_detected();
            findings.push((path_display.clone(), emission.secret, emission.absolute_start));
        }
    }

    info!(count = findings.len(), "detection complete");

    let rendered = if args.validate {
        validate_findings(findings, &config).await
    } else {
        findings
            .into_iter()
            .map(|(path, secret, absolute_start)| ScanFinding {
                path,
                kind: secret.kind().to_string(),
                absolute_start,
                status: None,
            })
            .collect()
    };

    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

/// Runs every finding's validation concurrently via one task per finding,
/// matching the design's "Validation Engine may be called from parallel
/// workers" concurrency model.
async fn validate_findings(
    findings: Vec<(String, Box<dyn secretscan_core::secret::Secret>, usize)>,
    config: &ScanConfig,
) -> Vec<ScanFinding> {
    let client = Arc::new(reqwest::Client::new());
    let engine = Arc::new(build_validation_engine(config, client));
    let cancel = CancellationToken::none();

    let mut tasks = JoinSet::new();
    for (path, secret, absolute_start) in findings {
        let engine = engine.clone();
        let cancel = cancel.clone();
        tasks.spawn(async move {
            let outcome = engine.validate(secret.as_ref(), &cancel).await;
            ScanFinding {
                path,
                kind: secret.kind().to_string(),
                absolute_start,
                status: Some(format_status(outcome.status)),
            }
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(finding) => results.push(finding),
            Err(err) => error!(error = %err, "validation task panicked"),
        }
    }
    results
}

fn format_status(status: ValidationStatus) -> String {
    match status {
        ValidationStatus::Valid => "valid",
        ValidationStatus::Invalid => "invalid",
        ValidationStatus::Unsupported => "unsupported",
        ValidationStatus::Failed => "failed",
    }
    .to_string()
}

fn collect_files(root: &PathBuf) -> Result<Vec<PathBuf>, CliError> {
    if root.is_file() {
        return Ok(vec![root.clone()]);
    }

    let mut files = Vec::new();
    for entry in WalkBuilder::new(root).build() {
        let entry = entry.map_err(CliError::Walk)?;
        if entry.file_type().map(|ft| ft.is_file()).unwrap_or(false) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}
