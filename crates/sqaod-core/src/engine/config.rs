use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

pub use crate::core::linalg::Backend;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{parameter}': {reason}")]
    Invalid {
        parameter: &'static str,
        reason: String,
    },

    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML from {path}: {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
}

/// Construction-time settings of an annealer.
///
/// `seed` and `num_trotters` are optional; when absent, `init_anneal` picks its defaults
/// (a time-derived seed and `max(1, (N0 + N1) / 4)` replicas).
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnnealerConfig {
    pub backend: Backend,
    pub seed: Option<u64>,
    pub num_trotters: Option<usize>,
}

impl AnnealerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_trotters == Some(0) {
            return Err(ConfigError::Invalid {
                parameter: "num_trotters",
                reason: "must be a positive integer".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct AnnealerConfigBuilder {
    backend: Option<Backend>,
    seed: Option<u64>,
    num_trotters: Option<usize>,
}

impl AnnealerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn backend(mut self, backend: Backend) -> Self {
        self.backend = Some(backend);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn num_trotters(mut self, m: usize) -> Self {
        self.num_trotters = Some(m);
        self
    }

    pub fn build(self) -> Result<AnnealerConfig, ConfigError> {
        let config = AnnealerConfig {
            backend: self
                .backend
                .ok_or(ConfigError::MissingParameter("backend"))?,
            seed: self.seed,
            num_trotters: self.num_trotters,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Reads and deserializes a TOML document.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    parse_toml(&content, &path.to_string_lossy())
}

/// Deserializes a TOML document; `origin` names the source in errors.
pub fn parse_toml<T: DeserializeOwned>(content: &str, origin: &str) -> Result<T, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::Toml {
        path: origin.to_string(),
        source: e,
    })
}
