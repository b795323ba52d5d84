//! ## secretscan-telemetry::metrics
//! Prometheus exporter tracking scan throughput and validation latency.

use prometheus::{Counter, Histogram, HistogramOpts, Registry};

#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    pub registry: prometheus::Registry,
    pub secrets_detected: prometheus::Counter,
    pub validation_latency: prometheus::Histogram,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        let registry = Registry::new();
        let secrets_detected =
            Counter::new("secretscan_secrets_detected_total", "Total secrets detected across all scanned input").unwrap();

        let validation_latency = Histogram::with_opts(
            HistogramOpts::new(
                "secretscan_validation_latency_seconds",
                "Time spent validating one detected secret against its issuing service",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )
        .unwrap();

        registry
            .register(Box::new(secrets_detected.clone()))
            .unwrap();
        registry
            .register(Box::new(validation_latency.clone()))
            .unwrap();

        Self {
            registry,
            secrets_detected,
            validation_latency,
        }
    }

    pub fn gather_metrics(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::<u8>::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer).unwrap())
    }

    pub fn inc_secrets_detected(&self) {
        self.secrets_detected.inc();
    }
}
