use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("loading configuration: {0}")]
    Config(#[from] secretscan_config::ConfigError),

    #[error("walking directory tree: {0}")]
    Walk(#[from] ignore::Error),

    #[error("building detector registry: {0}")]
    Registry(#[from] secretscan_detectors::RegistryError),

    #[error("rendering report: {0}")]
    Report(#[from] serde_json::Error),
}
