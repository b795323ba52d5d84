//! # secretscan-telemetry
//!
//! Logging and metrics for the secret-scanning runtime.

pub mod logging;
pub mod metrics;

pub use logging::EventLogger;
pub use metrics::MetricsRecorder;
