//! Implementation of the `ragguard threads` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, ThreadSummary};
use crate::infrastructure::setup::open_session_store;

#[derive(Args, Debug)]
pub struct ThreadsArgs {
    /// Maximum threads to list
    #[arg(short, long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Debug, Serialize)]
pub struct ThreadsOutput {
    pub threads: Vec<ThreadSummary>,
    pub total: usize,
}

impl CommandOutput for ThreadsOutput {
    fn to_human(&self) -> String {
        if self.threads.is_empty() {
            return "No conversation threads found.".to_string();
        }
        format!(
            "Found {} thread(s):\n{}",
            self.total,
            TableFormatter::new().format_threads(&self.threads)
        )
    }
}

pub async fn execute(args: ThreadsArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = open_session_store(config)
        .await
        .context("Failed to open session store")?;

    let threads = store
        .list_threads(args.limit)
        .await
        .context("Failed to list threads")?;

    let total = threads.len();
    output(&ThreadsOutput { threads, total }, json_mode);
    Ok(())
}
