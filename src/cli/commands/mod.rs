//! CLI command implementations.

pub mod ask;
pub mod config;
pub mod history;
pub mod index;
pub mod query;
pub mod search;
pub mod threads;

use anyhow::{Context, Result};

use crate::domain::errors::DomainError;
use crate::domain::models::Config;
use crate::infrastructure::AppServices;

/// Parse a `--top-k` value; zero is rejected.
pub(crate) fn parse_top_k(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("top-k must be at least 1".to_string()),
        Ok(k) => Ok(k),
        Err(e) => Err(format!("invalid top-k '{value}': {e}")),
    }
}

pub(crate) async fn open_services(config: &Config) -> Result<AppServices> {
    AppServices::from_config(config)
        .await
        .context("Failed to initialize services")
}

/// Open the services and require a persisted index.
pub(crate) async fn open_with_index(config: &Config) -> Result<AppServices> {
    let services = open_services(config).await?;
    let loaded = services.load_index().await.context("Failed to load index")?;
    if !loaded {
        return Err(DomainError::NotFound(format!(
            "no index at {}; run `ragguard index <folder>` first",
            config.index.path
        ))
        .into());
    }
    Ok(services)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_top_k() {
        assert_eq!(parse_top_k("3"), Ok(3));
        assert!(parse_top_k("0").is_err());
        assert!(parse_top_k("-1").is_err());
        assert!(parse_top_k("many").is_err());
    }
}
