//! Configuration file
//!
//! A single JSON object. Every key is optional; missing keys take
//! their defaults.
//!
//! ```json
//! {
//!   "xlink_resolver_enabled": true,
//!   "allow_referenced_deletion": false,
//!   "flush_timeout_ms": 5000,
//!   "indexing_interval_ms": 1000,
//!   "max_index_retries": 3,
//!   "log_level": "INFO"
//! }
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::errors::{ConfigError, ConfigResult};
use crate::observability::Severity;

/// Catalog configuration as read from disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Resolve cross-references at index time
    #[serde(default)]
    pub xlink_resolver_enabled: bool,

    /// Allow deleting records other records still point at
    #[serde(default)]
    pub allow_referenced_deletion: bool,

    /// Deadline for a flush barrier
    #[serde(default = "default_flush_timeout_ms")]
    pub flush_timeout_ms: u64,

    /// Period of the background indexer
    #[serde(default = "default_indexing_interval_ms")]
    pub indexing_interval_ms: u64,

    /// Attempts before an index job that keeps failing is dropped
    #[serde(default = "default_max_index_retries")]
    pub max_index_retries: u32,

    /// Minimum log severity
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_flush_timeout_ms() -> u64 {
    5_000
}
fn default_indexing_interval_ms() -> u64 {
    1_000
}
fn default_max_index_retries() -> u32 {
    3
}
fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            xlink_resolver_enabled: false,
            allow_referenced_deletion: false,
            flush_timeout_ms: default_flush_timeout_ms(),
            indexing_interval_ms: default_indexing_interval_ms(),
            max_index_retries: default_max_index_retries(),
            log_level: default_log_level(),
        }
    }
}

impl CatalogConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Unreadable(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: CatalogConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.flush_timeout_ms == 0 {
            return Err(ConfigError::invalid("flush_timeout_ms", "must be > 0"));
        }
        if self.indexing_interval_ms == 0 {
            return Err(ConfigError::invalid("indexing_interval_ms", "must be > 0"));
        }
        if self.max_index_retries == 0 {
            return Err(ConfigError::invalid("max_index_retries", "must be > 0"));
        }
        self.severity()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse()
            .map_err(|e: String| ConfigError::invalid("log_level", e))
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms)
    }

    pub fn indexing_interval(&self) -> Duration {
        Duration::from_millis(self.indexing_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = CatalogConfig::from_json("{}").unwrap();
        assert_eq!(config, CatalogConfig::default());
        assert!(!config.xlink_resolver_enabled);
        assert!(!config.allow_referenced_deletion);
        assert_eq!(config.flush_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"xlink_resolver_enabled": true, "allow_referenced_deletion": true, "log_level": "warn"}}"#
        )
        .unwrap();

        let config = CatalogConfig::load(file.path()).unwrap();
        assert!(config.xlink_resolver_enabled);
        assert!(config.allow_referenced_deletion);
        assert_eq!(config.severity().unwrap(), Severity::Warn);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = CatalogConfig::from_json(r#"{"flush_timeout_ms": 0}"#).unwrap_err();
        assert_eq!(err.code(), "METACAT_CONFIG_INVALID");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = CatalogConfig::from_json(r#"{"xlink": true}"#).unwrap_err();
        assert_eq!(err.code(), "METACAT_CONFIG_MALFORMED");
    }

    #[test]
    fn test_bad_log_level_rejected() {
        assert!(CatalogConfig::from_json(r#"{"log_level": "chatty"}"#).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = CatalogConfig::load(Path::new("/nonexistent/metacat.json")).unwrap_err();
        assert_eq!(err.code(), "METACAT_CONFIG_UNREADABLE");
    }
}
