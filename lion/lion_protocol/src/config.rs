//! Engine configuration.
//!
//! Read from the `[engine]` table of a declaration file or from a
//! standalone TOML file. Every field has a default.

use std::path::Path;

use lion_core::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a [`ConformanceEngine`](crate::check::ConformanceEngine).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether type-level results are memoized.
    pub cache_enabled: bool,

    /// Maximum number of cached results, `0` for no limit.
    pub cache_capacity: usize,

    /// Audit entries kept per protocol, `0` to disable the audit log.
    pub audit_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_capacity: 4096,
            audit_capacity: 0,
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Failed to parse engine config: {}", e)))
    }

    /// Load a configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Write this configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("Failed to serialize engine config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = EngineConfig::from_toml_str("cache_capacity = 16").unwrap();
        assert_eq!(config.cache_capacity, 16);
        assert!(config.cache_enabled);
        assert_eq!(config.audit_capacity, 0);
    }

    #[test]
    fn test_bad_toml_is_a_config_error() {
        let err = EngineConfig::from_toml_str("cache_enabled = \"sometimes\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("engine.toml");
        let config = EngineConfig {
            cache_enabled: false,
            cache_capacity: 0,
            audit_capacity: 50,
        };

        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = EngineConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
