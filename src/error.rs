//! Error types for the spimux command line

use std::path::PathBuf;

use thiserror::Error;

/// Command line errors
#[derive(Debug, Error)]
pub enum CliError {
    /// Driver rejected an operation
    #[error("{0}")]
    Spi(#[from] spimux_core::Error),

    /// Device option string could not be parsed
    #[error("Invalid option {key}={value}: {reason}")]
    InvalidOption {
        key: String,
        value: String,
        reason: String,
    },

    /// Hex data could not be parsed
    #[error("Invalid hex data: {0}")]
    InvalidHex(String),

    /// Transfer names a device the bus file does not declare
    #[error("Unknown device name: {0}")]
    UnknownDevice(String),

    /// Failed to read a file
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bus file is not valid TOML or has the wrong shape
    #[error("Invalid bus file: {0}")]
    BusFile(#[from] toml::de::Error),
}

impl CliError {
    pub(crate) fn option(key: &str, value: &str, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for command line operations
pub type Result<T> = std::result::Result<T, CliError>;
