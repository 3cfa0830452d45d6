//! Configuration errors

use thiserror::Error;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Unreadable(String),

    #[error("Invalid config JSON: {0}")]
    Malformed(String),

    #[error("Invalid config value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Unknown setting: {0}")]
    UnknownSetting(String),
}

impl ConfigError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::Unreadable(_) => "METACAT_CONFIG_UNREADABLE",
            ConfigError::Malformed(_) => "METACAT_CONFIG_MALFORMED",
            ConfigError::InvalidValue { .. } => "METACAT_CONFIG_INVALID",
            ConfigError::UnknownSetting(_) => "METACAT_UNKNOWN_SETTING",
        }
    }

    pub(crate) fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}
