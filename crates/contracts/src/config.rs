//! Fork configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default capacity for tap and output channels
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Default capacity of the merged output channel
pub const DEFAULT_MERGE_CAPACITY: usize = 16;

/// Fork configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkConfig {
    /// Fork name (used for logging/metrics)
    #[serde(default = "default_fork_name")]
    pub name: String,

    /// Capacity of every channel the fork creates (taps, outputs)
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Capacity of the merge sink's combined output
    #[serde(default = "default_merge_capacity")]
    pub merge_capacity: usize,
}

fn default_fork_name() -> String {
    "fork".to_string()
}

fn default_channel_capacity() -> usize {
    DEFAULT_CHANNEL_CAPACITY
}

fn default_merge_capacity() -> usize {
    DEFAULT_MERGE_CAPACITY
}

impl Default for ForkConfig {
    fn default() -> Self {
        Self {
            name: default_fork_name(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            merge_capacity: DEFAULT_MERGE_CAPACITY,
        }
    }
}

impl ForkConfig {
    /// Create a default configuration with the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Validate configuration values
    ///
    /// # Errors
    /// Empty name or zero capacities.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::validation("fork.name", "name cannot be empty"));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::validation(
                "fork.channel_capacity",
                "channel_capacity must be > 0",
            ));
        }
        if self.merge_capacity == 0 {
            return Err(ConfigError::validation(
                "fork.merge_capacity",
                "merge_capacity must be > 0",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: ForkConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ForkConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = ForkConfig {
            channel_capacity: 0,
            ..ForkConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("channel_capacity"));
    }

    #[test]
    fn test_blank_name_rejected() {
        assert!(ForkConfig::named("  ").validate().is_err());
    }
}
