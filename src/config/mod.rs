//! Catalog configuration
//!
//! `CatalogConfig` is what is read from disk at startup; `Settings` is
//! the live, shared view the components consult on every operation.

mod errors;
mod file;
mod settings;

pub use errors::{ConfigError, ConfigResult};
pub use file::CatalogConfig;
pub use settings::{
    Settings, ALLOW_REFERENCED_DELETION, FLUSH_TIMEOUT_MS, MAX_INDEX_RETRIES,
    XLINK_RESOLVER_ENABLED,
};
