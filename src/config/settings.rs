//! Runtime settings
//!
//! Process-wide, readable from any thread without locking and
//! changeable while the catalog is running.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{json, Value};

use super::errors::{ConfigError, ConfigResult};
use super::file::CatalogConfig;
use crate::observability::{log_event_with_fields, Event};

pub const XLINK_RESOLVER_ENABLED: &str = "xlink_resolver_enabled";
pub const ALLOW_REFERENCED_DELETION: &str = "allow_referenced_deletion";
pub const FLUSH_TIMEOUT_MS: &str = "flush_timeout_ms";
pub const MAX_INDEX_RETRIES: &str = "max_index_retries";

/// Live settings shared by every catalog component
#[derive(Debug)]
pub struct Settings {
    xlink_resolver_enabled: AtomicBool,
    allow_referenced_deletion: AtomicBool,
    flush_timeout_ms: AtomicU64,
    max_index_retries: AtomicU32,
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_config(&CatalogConfig::default())
    }
}

impl Settings {
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            xlink_resolver_enabled: AtomicBool::new(config.xlink_resolver_enabled),
            allow_referenced_deletion: AtomicBool::new(config.allow_referenced_deletion),
            flush_timeout_ms: AtomicU64::new(config.flush_timeout_ms),
            max_index_retries: AtomicU32::new(config.max_index_retries),
        }
    }

    pub fn xlink_resolver_enabled(&self) -> bool {
        self.xlink_resolver_enabled.load(Ordering::Acquire)
    }

    pub fn allow_referenced_deletion(&self) -> bool {
        self.allow_referenced_deletion.load(Ordering::Acquire)
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_millis(self.flush_timeout_ms.load(Ordering::Acquire))
    }

    pub fn max_index_retries(&self) -> u32 {
        self.max_index_retries.load(Ordering::Acquire)
    }

    pub fn set_xlink_resolver_enabled(&self, enabled: bool) {
        self.xlink_resolver_enabled.store(enabled, Ordering::Release);
        log_changed(XLINK_RESOLVER_ENABLED, &enabled.to_string());
    }

    pub fn set_allow_referenced_deletion(&self, allowed: bool) {
        self.allow_referenced_deletion.store(allowed, Ordering::Release);
        log_changed(ALLOW_REFERENCED_DELETION, &allowed.to_string());
    }

    pub fn set_flush_timeout(&self, timeout: Duration) {
        let ms = timeout.as_millis().clamp(1, u64::MAX as u128) as u64;
        self.flush_timeout_ms.store(ms, Ordering::Release);
        log_changed(FLUSH_TIMEOUT_MS, &ms.to_string());
    }

    /// Set a setting by key from a JSON value.
    pub fn set_value(&self, key: &str, value: &Value) -> ConfigResult<()> {
        match key {
            XLINK_RESOLVER_ENABLED => self.set_xlink_resolver_enabled(as_bool(key, value)?),
            ALLOW_REFERENCED_DELETION => self.set_allow_referenced_deletion(as_bool(key, value)?),
            FLUSH_TIMEOUT_MS => {
                let ms = as_positive(key, value)?;
                self.set_flush_timeout(Duration::from_millis(ms));
            }
            MAX_INDEX_RETRIES => {
                let n = u32::try_from(as_positive(key, value)?)
                    .map_err(|_| ConfigError::invalid(key, "out of range"))?;
                self.max_index_retries.store(n, Ordering::Release);
                log_changed(key, &n.to_string());
            }
            other => return Err(ConfigError::UnknownSetting(other.to_string())),
        }
        Ok(())
    }

    /// Current values as a JSON object
    pub fn to_json(&self) -> Value {
        json!({
            XLINK_RESOLVER_ENABLED: self.xlink_resolver_enabled(),
            ALLOW_REFERENCED_DELETION: self.allow_referenced_deletion(),
            FLUSH_TIMEOUT_MS: self.flush_timeout_ms.load(Ordering::Acquire),
            MAX_INDEX_RETRIES: self.max_index_retries(),
        })
    }
}

fn as_bool(key: &str, value: &Value) -> ConfigResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::String(s) if s == "true" => Ok(true),
        Value::String(s) if s == "false" => Ok(false),
        _ => Err(ConfigError::invalid(key, "expected a boolean")),
    }
}

fn as_positive(key: &str, value: &Value) -> ConfigResult<u64> {
    match value.as_u64() {
        Some(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::invalid(key, "expected a positive integer")),
    }
}

fn log_changed(key: &str, value: &str) {
    log_event_with_fields(Event::SettingChanged, &[("key", key), ("value", value)]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(!settings.xlink_resolver_enabled());
        assert!(!settings.allow_referenced_deletion());
        assert_eq!(settings.max_index_retries(), 3);
    }

    #[test]
    fn test_set_value_bool() {
        let settings = Settings::default();
        settings.set_value(ALLOW_REFERENCED_DELETION, &json!(true)).unwrap();
        assert!(settings.allow_referenced_deletion());

        settings.set_value(XLINK_RESOLVER_ENABLED, &json!("true")).unwrap();
        assert!(settings.xlink_resolver_enabled());
    }

    #[test]
    fn test_set_value_rejects_wrong_type() {
        let settings = Settings::default();
        let err = settings.set_value(ALLOW_REFERENCED_DELETION, &json!(1)).unwrap_err();
        assert_eq!(err.code(), "METACAT_CONFIG_INVALID");
        assert!(!settings.allow_referenced_deletion());
    }

    #[test]
    fn test_set_value_unknown_key() {
        let err = Settings::default().set_value("nope", &json!(true)).unwrap_err();
        assert_eq!(err.code(), "METACAT_UNKNOWN_SETTING");
    }

    #[test]
    fn test_flush_timeout_roundtrip() {
        let settings = Settings::default();
        settings.set_value(FLUSH_TIMEOUT_MS, &json!(250)).unwrap();
        assert_eq!(settings.flush_timeout(), Duration::from_millis(250));
        assert_eq!(settings.to_json()[FLUSH_TIMEOUT_MS], 250);
    }
}
