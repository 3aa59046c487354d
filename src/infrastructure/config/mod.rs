//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - `.env` loading for API keys
//! - YAML file loading
//! - Environment variable overrides
//! - Configuration validation

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, CONFIG_DIR, ENV_PREFIX};
