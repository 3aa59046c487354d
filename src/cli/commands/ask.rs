//! Implementation of the `ragguard ask` command.

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use tracing::warn;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{AskError, AskResponse, Config};

use super::open_services;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// Question to answer
    pub question: String,

    /// Continue an existing conversation thread
    #[arg(short, long)]
    pub thread: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskOutput {
    pub question: String,
    pub thread_id: String,
    pub answer: String,
    pub validated: bool,
    pub retrieve_cycles: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AskError>,
}

impl AskOutput {
    fn new(question: String, response: AskResponse) -> Self {
        Self {
            question,
            thread_id: response.thread_id,
            answer: response.answer,
            validated: response.validated,
            retrieve_cycles: response.retrieve_cycles,
            error: response.error,
        }
    }
}

impl CommandOutput for AskOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.answer.clone(), String::new()];
        let verdict = if self.validated { "validated" } else { "not validated" };
        let cycles = if self.retrieve_cycles == 1 { "cycle" } else { "cycles" };
        lines.push(format!(
            "thread: {} | {} | {} retrieve {}",
            self.thread_id, verdict, self.retrieve_cycles, cycles
        ));
        if let Some(error) = &self.error {
            lines.push(format!("error ({}): {}", error.kind, error.message));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: AskArgs, config: &Config, json_mode: bool) -> Result<()> {
    let services = open_services(config).await?;
    if !services.load_index().await.context("Failed to load index")? {
        // The orchestrator reports the missing index in a degraded response.
        warn!(path = %config.index.path, "no persisted index found");
    }

    let response = services.orchestrator.ask(&args.question, args.thread).await;
    output(&AskOutput::new(args.question, response), json_mode);
    Ok(())
}
