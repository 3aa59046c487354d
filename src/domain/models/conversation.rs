//! Conversation state carried through the answer graph.
//!
//! ```text
//! Retrieve → Generate → Validate ─┬─ passed ─────────────→ End
//!    ↑                            ├─ failed, under cap ──→ Retrieve
//!    └────────────────────────────┘  failed, cap reached → End
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message in a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Nodes of the answer graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphNode {
    Retrieve,
    Generate,
    Validate,
    End,
}

impl GraphNode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieve => "retrieve",
            Self::Generate => "generate",
            Self::Validate => "validate",
            Self::End => "end",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::End)
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-conversation state, checkpointed by the session store after every
/// node transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub thread_id: String,
    pub messages: Vec<ChatMessage>,
    pub retrieved_context: String,
    pub answer: String,
    pub validation_passed: bool,
    pub retry_count: u32,
    /// Monotonic checkpoint counter.
    #[serde(default)]
    pub step: u64,
    /// Node that runs next; `End` when the conversation is idle.
    #[serde(default = "default_next_node")]
    pub next_node: GraphNode,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const fn default_next_node() -> GraphNode {
    GraphNode::End
}

impl ConversationState {
    pub fn new(thread_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            retrieved_context: String::new(),
            answer: String::new(),
            validation_passed: false,
            retry_count: 0,
            step: 0,
            next_node: GraphNode::End,
            created_at: now,
            updated_at: now,
        }
    }

    /// Content of the most recent user message.
    pub fn latest_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Drop the oldest messages so at most `max` remain. `0` means no limit.
    pub fn trim_history(&mut self, max: usize) {
        if max > 0 && self.messages.len() > max {
            let excess = self.messages.len() - max;
            self.messages.drain(..excess);
        }
    }

    /// Record a transition: bump the step counter and the update time.
    pub fn advance(&mut self, next: GraphNode) {
        self.next_node = next;
        self.step += 1;
        self.updated_at = Utc::now();
    }
}

/// Listing entry for a stored conversation thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub thread_id: String,
    pub message_count: usize,
    pub step: u64,
    pub next_node: GraphNode,
    pub updated_at: DateTime<Utc>,
}

impl From<&ConversationState> for ThreadSummary {
    fn from(state: &ConversationState) -> Self {
        Self {
            thread_id: state.thread_id.clone(),
            message_count: state.messages.len(),
            step: state.step,
            next_node: state.next_node,
            updated_at: state.updated_at,
        }
    }
}

/// Binary outcome of the validation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub passed: bool,
}

/// Token the judge must answer with to accept an answer.
pub const VERDICT_PASS: &str = "VALID";

/// Token the judge must answer with to reject an answer.
pub const VERDICT_FAIL: &str = "INVALID";

impl ValidationVerdict {
    pub const PASSED: Self = Self { passed: true };
    pub const FAILED: Self = Self { passed: false };

    /// Parse a judge response under the single-token contract.
    ///
    /// Only the first token counts, compared case-insensitively after
    /// stripping fences, quotes and punctuation. Anything other than
    /// `VALID` is a failure, including unparseable output.
    pub fn from_response(response: &str) -> Self {
        match first_token(response) {
            Some(token) if token.eq_ignore_ascii_case(VERDICT_PASS) => Self::PASSED,
            Some(token) if token.eq_ignore_ascii_case(VERDICT_FAIL) => Self::FAILED,
            other => {
                tracing::warn!(
                    token = other.unwrap_or(""),
                    "judge response did not follow the verdict contract; treating as failed"
                );
                Self::FAILED
            }
        }
    }
}

fn first_token(response: &str) -> Option<&str> {
    response
        .split(|c: char| c.is_whitespace())
        .map(|t| t.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .find(|t| !t.is_empty())
}

/// Request-layer result of a conversational ask.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub thread_id: String,
    pub answer: String,
    pub validated: bool,
    /// Number of Retrieve cycles the invocation ran.
    pub retrieve_cycles: u32,
    /// Set when the invocation aborted and the answer is a degraded fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AskError>,
}

/// Error details attached to a degraded response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskError {
    pub kind: String,
    pub message: String,
}
