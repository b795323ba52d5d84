//! Observability configuration: tracing subscriber setup parameters.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation;

/// Telemetry configuration consumed by `secretscan-telemetry`.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct TelemetryConfig {
    /// `tracing_subscriber::EnvFilter` directive, e.g. `"info"` or
    /// `"secretscan_core=debug,warn"`.
    #[serde(default = "default_log_filter")]
    #[validate(length(min = 1))]
    pub log_filter: String,

    /// Emit JSON-formatted log lines instead of the human-readable default.
    #[serde(default)]
    pub json: bool,

    #[validate(nested)]
    pub metrics: MetricsConfig,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            json: false,
            metrics: MetricsConfig::default(),
        }
    }
}

fn default_log_filter() -> String {
    "info".to_string()
}

/// Prometheus metrics exporter configuration.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct MetricsConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_metrics_addr")]
    #[validate(custom(function = validation::validate_socket_addr))]
    pub listen_addr: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_metrics_addr(),
        }
    }
}

fn default_metrics_addr() -> String {
    "127.0.0.1:9898".to_string()
}
