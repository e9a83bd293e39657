use thiserror::Error;

use tally_config::ConfigError;
use tally_core::CoreError;

/// Failures surfaced by the `tally` binary.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP listener error: {0}")]
    Http(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
