//! Implementation of the `ragguard history` command.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::errors::DomainError;
use crate::domain::models::{ChatMessage, Config, ConversationState, GraphNode};
use crate::infrastructure::setup::open_session_store;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Conversation thread id
    pub thread_id: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryOutput {
    pub thread_id: String,
    pub messages: Vec<ChatMessage>,
    pub step: u64,
    pub next_node: GraphNode,
    pub validated: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ConversationState> for HistoryOutput {
    fn from(state: ConversationState) -> Self {
        Self {
            thread_id: state.thread_id,
            messages: state.messages,
            step: state.step,
            next_node: state.next_node,
            validated: state.validation_passed,
            created_at: state.created_at,
            updated_at: state.updated_at,
        }
    }
}

impl CommandOutput for HistoryOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Thread {}", self.thread_id),
            format!(
                "Started {}, updated {}",
                self.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
                self.updated_at.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            "─────────────────────────────────────────".to_string(),
        ];
        if self.messages.is_empty() {
            lines.push("(no messages)".to_string());
        }
        for message in &self.messages {
            lines.push(format!("[{}] {}", message.role.as_str(), message.content));
        }
        if !self.next_node.is_terminal() {
            lines.push(format!("\nInterrupted before node '{}'", self.next_node));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: HistoryArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = open_session_store(config)
        .await
        .context("Failed to open session store")?;

    let state = store
        .get(&args.thread_id)
        .await
        .context("Failed to load conversation")?
        .ok_or_else(|| DomainError::NotFound(format!("no conversation thread '{}'", args.thread_id)))?;

    output(&HistoryOutput::from(state), json_mode);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_output_lists_messages_in_order() {
        let mut state = ConversationState::new("t1");
        state.messages.push(ChatMessage::user("What is XSS?"));
        state.messages.push(ChatMessage::assistant("Cross-site scripting."));

        let human = HistoryOutput::from(state).to_human();
        let user = human.find("[user] What is XSS?").unwrap();
        let assistant = human.find("[assistant] Cross-site scripting.").unwrap();
        assert!(user < assistant);
        assert!(!human.contains("Interrupted"));
    }

    #[test]
    fn test_interrupted_thread_is_flagged() {
        let mut state = ConversationState::new("t1");
        state.advance(GraphNode::Validate);
        let human = HistoryOutput::from(state).to_human();
        assert!(human.contains("Interrupted before node 'validate'"));
    }
}
