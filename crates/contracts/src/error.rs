//! Layered error definitions
//!
//! Categorized by channel: in-band stream errors / configuration errors

use thiserror::Error;

/// Error carried in-band on a readable.
///
/// Must stay `Clone`: a single upstream error is fanned out to every tap.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// A participant callback failed while producing output
    #[error("participant '{participant}' failed: {message}")]
    Participant { participant: String, message: String },

    /// A transform stage rejected an item
    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    /// The other end of a channel went away
    #[error("channel closed: {0}")]
    Closed(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl FlowError {
    /// Create participant error
    pub fn participant(participant: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Participant {
            participant: participant.into(),
            message: message.into(),
        }
    }

    /// Create stage error
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Create closed-channel error
    pub fn closed(what: impl Into<String>) -> Self {
        Self::Closed(what.into())
    }
}

/// Configuration loading error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration parse error
    #[error("config parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    Validation { field: String, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConfigError {
    /// Create configuration parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_error_display() {
        let err = FlowError::stage("upper", "bad utf-8");
        assert_eq!(err.to_string(), "stage 'upper' failed: bad utf-8");

        let err = FlowError::participant("counter", "overflow");
        assert!(err.to_string().contains("counter"));
    }

    #[test]
    fn test_config_validation_display() {
        let err = ConfigError::validation("fork.channel_capacity", "must be > 0");
        assert_eq!(
            err.to_string(),
            "config validation error at 'fork.channel_capacity': must be > 0"
        );
    }
}
