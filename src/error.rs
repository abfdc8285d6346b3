//! Error types for vectorlab.

use std::path::PathBuf;

use thiserror::Error;

/// Failure of a single draw command. The render queue logs and skips these.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DrawError {
    #[error("non-finite screen position in {0}")]
    NonFinite(&'static str),

    #[error("degenerate shape: {0}")]
    Degenerate(String),

    #[error("paint callback panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config value: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
