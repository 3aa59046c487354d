//! Implementation of the `ragguard search` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

use super::{open_with_index, parse_top_k};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Question to retrieve passages for
    pub question: String,

    /// Passages to retrieve (defaults to retrieval.top_k)
    #[arg(short = 'k', long, value_parser = parse_top_k)]
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchOutput {
    pub question: String,
    pub top_k: usize,
    /// Condensed context, empty when nothing matched.
    pub context: String,
}

impl CommandOutput for SearchOutput {
    fn to_human(&self) -> String {
        if self.context.is_empty() {
            "No relevant passages found.".to_string()
        } else {
            self.context.clone()
        }
    }
}

pub async fn execute(args: SearchArgs, config: &Config, json_mode: bool) -> Result<()> {
    let services = open_with_index(config).await?;
    let top_k = args.top_k.unwrap_or(config.retrieval.top_k);

    let context = services
        .retrieval
        .search_and_summarize(&args.question, top_k)
        .await
        .context("Search failed")?;

    output(
        &SearchOutput {
            question: args.question,
            top_k,
            context,
        },
        json_mode,
    );
    Ok(())
}
