//! Errors reported by the relay.
//!
//! Every variant is a single-line message for stderr; `main` prints it and
//! exits with status 1. A container that is not running is not an error.

use std::io;
use std::path::PathBuf;

/// Relay errors
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("The configuration for {0} does not exist")]
    ConfigurationMissing(String),

    #[error("Failed to parse {path}: {message}")]
    ConfigurationParse { path: PathBuf, message: String },

    #[error("Error reading configuration: {0}")]
    ConfigurationUnmarshal(String),

    #[error("Not using docker-compose but no image is configured for {0}")]
    MissingImage(String),

    #[error("The {0} binary was not found.")]
    BinaryNotFound(String),

    #[error("Container lookup failed: {0}")]
    Resolver(String),

    #[error("Failed to execute {binary}: {source}")]
    Exec {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<relay_record::RecordError> for RelayError {
    fn from(err: relay_record::RecordError) -> Self {
        RelayError::ConfigurationUnmarshal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
