//! # secretscan-config
//!
//! Hierarchical configuration management for the secret-scanning runtime.
//!
//! ## Features
//! - **Unified configuration**: engine sizing, detectors, and validators
//!   loaded from one source of truth.
//! - **Validation**: runtime validation of every loaded record via `validator`.
//! - **Layered sources**: defaults, then `config/secretscan.yaml`, then
//!   `config/<environment>.yaml`, then `SECRETSCAN_*` environment variables.

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod detectors;
mod engine;
mod error;
mod provider;
mod telemetry;
mod validation;
mod validators;

pub use detectors::{DetectorConfig, FinderConfig, SimpleDetectorConfig, TupleDetectorConfig};
pub use engine::EngineConfig;
pub use error::ConfigError;
pub use provider::ConfigProvider;
pub use telemetry::{MetricsConfig, TelemetryConfig};
pub use validators::ValidatorConfig;

/// Top-level configuration for a scan run.
#[derive(Debug, Serialize, Deserialize, Validate, Clone)]
pub struct ScanConfig {
    /// Detection Engine sizing (`ReadLen`/`RetainLen`).
    #[validate(nested)]
    pub engine: EngineConfig,

    /// One record per configured detector.
    #[validate(nested)]
    pub detectors: Vec<DetectorConfig>,

    /// One record per configured validator, keyed by secret kind.
    #[validate(nested)]
    pub validators: Vec<ValidatorConfig>,

    #[validate(nested)]
    pub telemetry: TelemetryConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            detectors: Vec::new(),
            validators: Vec::new(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Load configuration from default files and environment.
    ///
    /// Hierarchy:
    /// 1. Default values.
    /// 2. `config/secretscan.yaml` — base settings, if present.
    /// 3. `config/<environment>.yaml` — environment-specific overrides.
    /// 4. `SECRETSCAN_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let figment = Figment::from(Serialized::defaults(ScanConfig::default()));

        let figment = if Path::new("config/secretscan.yaml").exists() {
            figment.merge(Yaml::file("config/secretscan.yaml"))
        } else {
            figment
        };

        let env = std::env::var("SECRETSCAN_ENV").unwrap_or_else(|_| "production".into());
        let env_file = format!("config/{env}.yaml");
        let figment = if Path::new(&env_file).exists() {
            figment.merge(Yaml::file(env_file))
        } else {
            figment
        };

        figment
            .merge(Env::prefixed("SECRETSCAN_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Load configuration from a specific file, bypassing the default search path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(
                path.to_string_lossy().to_string(),
            )));
        }

        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("SECRETSCAN_").split("__"))
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    pub fn load_with_provider(provider: &dyn ConfigProvider) -> Result<Self, ConfigError> {
        provider
            .load()
            .map_err(ConfigError::from)
            .and_then(|figment| figment.extract().map_err(ConfigError::from))
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = ScanConfig::default();
        config.validate().expect("default config should validate");
    }

    #[test]
    fn environment_override_of_engine_read_len() {
        std::env::set_var("SECRETSCAN_ENGINE__READ_LEN", "2097152");
        let config = ScanConfig::load().unwrap();
        assert_eq!(config.engine.read_len, 2_097_152);
        std::env::remove_var("SECRETSCAN_ENGINE__READ_LEN");
    }

    #[test]
    fn load_from_missing_path_reports_file_not_found() {
        let err = ScanConfig::load_from_path("/no/such/file.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }
}
