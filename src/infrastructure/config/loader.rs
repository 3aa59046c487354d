use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::domain::models::config::Config;

/// Directory holding project configuration, relative to the working directory.
pub const CONFIG_DIR: &str = ".ragguard";

/// Prefix of configuration environment variables.
pub const ENV_PREFIX: &str = "RAGGUARD_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Index path cannot be empty")]
    EmptyIndexPath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid orchestrator.max_retries: {0}. Must be at least 1")]
    InvalidValidationRetries(u32),

    #[error("Invalid {field}: must be greater than 0")]
    ZeroValue { field: &'static str },

    #[error("Invalid chunking: chunk_overlap ({overlap}) must be less than chunk_size ({size})")]
    InvalidChunking { size: usize, overlap: usize },

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid temperature: {0}. Must be between 0.0 and 2.0")]
    InvalidTemperature(f32),
}

impl From<ConfigError> for DomainError {
    fn from(err: ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for the current working directory.
    ///
    /// A `.env` file, when present, is read first so API keys can live there.
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .ragguard/config.yaml
    /// 3. .ragguard/local.yaml
    /// 4. Environment variables (RAGGUARD_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env file");
        }
        Self::load_from_dir(".")
    }

    /// Same layering as [`ConfigLoader::load`], rooted at `root`.
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<Config> {
        let dir = root.as_ref().join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, without environment overrides.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.index.path.is_empty() {
            return Err(ConfigError::EmptyIndexPath);
        }
        if config.index.chunk_size == 0 {
            return Err(ConfigError::ZeroValue { field: "index.chunk_size" });
        }
        if config.index.chunk_overlap >= config.index.chunk_size {
            return Err(ConfigError::InvalidChunking {
                size: config.index.chunk_size,
                overlap: config.index.chunk_overlap,
            });
        }

        let positive = [
            ("retrieval.top_k", config.retrieval.top_k),
            ("retrieval.max_passages", config.retrieval.max_passages),
            ("retrieval.max_context_chars", config.retrieval.max_context_chars),
            ("orchestrator.top_k", config.orchestrator.top_k),
            ("embedding.dimension", config.embedding.dimension),
            ("embedding.max_batch_size", config.embedding.max_batch_size),
        ];
        if let Some((field, _)) = positive.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::ZeroValue { field });
        }

        let timeouts = [
            ("generation.timeout_secs", config.generation.timeout_secs),
            ("embedding.timeout_secs", config.embedding.timeout_secs),
            ("storage.timeout_secs", config.storage.timeout_secs),
        ];
        if let Some((field, _)) = timeouts.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::ZeroValue { field });
        }

        if config.orchestrator.max_retries == 0 {
            return Err(ConfigError::InvalidValidationRetries(config.orchestrator.max_retries));
        }

        if let Some(temperature) = config.generation.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(ConfigError::InvalidTemperature(temperature));
            }
        }

        // Validate database config
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        // Validate logging config
        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidRotation(config.logging.rotation.clone()));
        }

        // Validate retry config
        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        Ok(())
    }
}
