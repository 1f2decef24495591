//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `ForkBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("fork.toml")).unwrap();
//! println!("Fork: {}", blueprint.fork.name);
//! ```

mod parser;
mod validator;

pub use contracts::ForkBlueprint;
pub use parser::ConfigFormat;

use contracts::ConfigError;
use std::path::Path;
use tracing::debug;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<ForkBlueprint, ConfigError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        debug!(path = %path.display(), ?format, "Loading configuration");
        Self::load_from_str(&content, format)
    }

    /// Load configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ForkBlueprint, ConfigError> {
        Self::parse_and_validate(content, format)
    }

    /// Serialize ForkBlueprint to TOML string
    pub fn to_toml(blueprint: &ForkBlueprint) -> Result<String, ConfigError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ConfigError::parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize ForkBlueprint to JSON string
    pub fn to_json(blueprint: &ForkBlueprint) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ConfigError::parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .ok_or_else(|| ConfigError::parse("cannot determine file format from extension"))?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| ConfigError::parse(format!("unsupported config format: .{ext}")))
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ConfigError> {
        Ok(std::fs::read_to_string(path)?)
    }

    /// Parse and validate configuration content
    fn parse_and_validate(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ForkBlueprint, ConfigError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_TOML: &str = r#"
[fork]
name = "lines"

[[batches]]
[[batches.branches]]
name = "upper"
op = "upper"

[[batches.branches]]
name = "rev"
op = "reverse"

[[batches]]
[[batches.branches]]
name = "errors"
op = "grep"
arg = "ERROR"
mode = "callback"
"#;

    #[test]
    fn test_load_from_str_toml() {
        let result = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.fork.name, "lines");
        assert_eq!(bp.batches.len(), 2);
        assert_eq!(bp.branch_count(), 3);
    }

    #[test]
    fn test_round_trip_toml() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let serialized = ConfigLoader::to_toml(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&serialized, ConfigFormat::Toml).unwrap();
        assert_eq!(bp.fork, bp2.fork);
        assert_eq!(bp.branch_count(), bp2.branch_count());
    }

    #[test]
    fn test_round_trip_json() {
        let bp = ConfigLoader::load_from_str(MINIMAL_TOML, ConfigFormat::Toml).unwrap();
        let json = ConfigLoader::to_json(&bp).unwrap();
        let bp2 = ConfigLoader::load_from_str(&json, ConfigFormat::Json).unwrap();
        assert_eq!(bp.fork.name, bp2.fork.name);
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(MINIMAL_TOML.as_bytes()).unwrap();

        let bp = ConfigLoader::load_from_path(file.path()).unwrap();
        assert_eq!(bp.branch_count(), 3);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let err = ConfigLoader::load_from_path(file.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::load_from_path(Path::new("/nonexistent/fork.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_validation_runs_after_parse() {
        let content = r#"
[[batches]]
[[batches.branches]]
name = "dup"
op = "upper"

[[batches.branches]]
name = "dup"
op = "lower"
"#;
        let result = ConfigLoader::load_from_str(content, ConfigFormat::Toml);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }
}
