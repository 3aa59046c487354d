//! Implementation of the `ragguard config` command.

use anyhow::Result;
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct ConfigArgs {}

/// Effective configuration with API keys masked.
#[derive(Debug, serde::Serialize)]
#[serde(transparent)]
pub struct ConfigOutput {
    config: Config,
}

impl CommandOutput for ConfigOutput {
    fn to_human(&self) -> String {
        serde_yaml::to_string(&self.config).unwrap_or_else(|e| format!("# failed to render: {e}"))
    }
}

pub fn execute(_args: ConfigArgs, config: &Config, json_mode: bool) -> Result<()> {
    output(
        &ConfigOutput {
            config: config.redacted(),
        },
        json_mode,
    );
    Ok(())
}
