use thiserror::Error;

use super::config::ConfigError;
use crate::core::linalg::error::LinalgError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Resource not initialized: {0}")]
    Uninitialized(&'static str),

    #[error("Linear algebra failed: {source}")]
    Linalg {
        #[from]
        source: LinalgError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },
}
