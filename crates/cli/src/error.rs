//! Error types for CLI operations.

use std::path::Path;

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Input file could not be opened
    #[error("Failed to open input {path}: {source}")]
    InputOpen {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Fork run error
    #[error("Fork run failed: {message}")]
    Run { message: String },
}

impl CliError {
    pub fn config_not_found(path: &Path) -> Self {
        Self::ConfigNotFound {
            path: path.display().to_string(),
        }
    }

    pub fn input_open(path: &Path, source: std::io::Error) -> Self {
        Self::InputOpen {
            path: path.display().to_string(),
            source,
        }
    }

    pub fn run(message: impl Into<String>) -> Self {
        Self::Run {
            message: message.into(),
        }
    }
}
