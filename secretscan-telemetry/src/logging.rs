//! ## secretscan-telemetry::logging
//! Structured logging setup, and a span helper for the two events worth
//! correlating across a scan: a detector firing, and a validator resolving.

use tracing::{info_span, Instrument};
use tracing_subscriber::fmt::format::FmtSpan;

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Installs the global tracing subscriber. Filter directive comes from
    /// `RUST_LOG`, falling back to `"info"` — callers that loaded a
    /// `secretscan_config::TelemetryConfig` should set `RUST_LOG` from its
    /// `log_filter` field before calling this.
    pub fn init() {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_thread_names(true)
            .with_span_events(FmtSpan::ENTER);

        let filter_layer = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new("info"))
            .unwrap();

        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    }

    /// Emits a structured log line for one finding, under a span so
    /// downstream collectors can correlate it with the file being scanned.
    #[inline]
    pub async fn log_finding(kind: &str, absolute_start: usize) {
        let span = info_span!("secret_detected", kind, absolute_start);

        async {
            tracing::info!(kind, absolute_start, "secret detected");
        }
        .instrument(span)
        .await
    }

    /// Emits a structured log line for one validation outcome.
    #[inline]
    pub async fn log_validation(kind: &str, status: &str) {
        let span = info_span!("secret_validated", kind, status);

        async {
            tracing::info!(kind, status, "secret validated");
        }
        .instrument(span)
        .await
    }
}
