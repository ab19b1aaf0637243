//! Error types for configuration loading and resolution

use std::path::PathBuf;
use thiserror::Error;

/// Result type for config operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading or reading a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly given path does not exist
    #[error("Configuration file not found at path {}", path.display())]
    FileNotFound { path: PathBuf },

    /// A required setting has no value anywhere in the chain
    #[error(
        "Configuration {key} was not found and does not have a default value. \
         Please verify your configuration file"
    )]
    MissingRequired { key: String },

    /// Unknown setting requested through `get_value`
    #[error("Unknown setting '{0}'")]
    AttributeNotFound(String),

    /// Unknown setting requested through dictionary-style access
    #[error("No config called '{0}'")]
    KeyNotFound(String),

    /// Description requested for a setting with no value
    #[error("No configuration called '{0}'")]
    NoSuchConfiguration(String),

    #[error("Failed to read configuration file: {}\n{source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source file is not a valid assignment-only snippet
    #[error("Failed to parse configuration {}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Environment variable could not be read
    #[error("Failed to read environment variable {var}: {message}")]
    EnvVar { var: String, message: String },
}

impl ConfigError {
    /// True for the errors surfaced as a fatal configuration problem
    /// (missing file at an explicit path, missing required setting).
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            ConfigError::FileNotFound { .. } | ConfigError::MissingRequired { .. }
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.into(),
            source,
        }
    }
}
