//! Self-validating answer graph.
//!
//! Each invocation runs Retrieve → Generate → Validate and then routes:
//! an accepted answer ends the run, a rejected one loops back to Retrieve
//! until the retry cap forces termination with the latest answer.
//! State is checkpointed through the [`SessionStore`] after every transition.

use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AskError, AskResponse, ChatMessage, ConversationState, GraphNode, OrchestratorConfig, ValidationVerdict,
};
use crate::domain::ports::TextGenerator;

use super::prompts;
use super::retrieval_search::RetrievalSearch;
use super::session_store::SessionStore;

/// Answer returned when an invocation aborts on an error.
pub const DEGRADED_ANSWER: &str =
    "Sorry, I could not answer that question right now. Please try again later.";

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Failed validations before the loop is forced to end.
    pub max_retries: u32,
    /// Passages fetched per Retrieve step.
    pub top_k: usize,
    /// History window per thread; 0 disables trimming.
    pub max_history_messages: usize,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from(&OrchestratorConfig::default())
    }
}

impl From<&OrchestratorConfig> for OrchestratorSettings {
    fn from(config: &OrchestratorConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            top_k: config.top_k,
            max_history_messages: config.max_history_messages,
        }
    }
}

/// Outcome of routing after a Validate step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Validation passed.
    Accept,
    /// Validation failed; run another Retrieve cycle.
    Retry,
    /// Validation failed and the retry cap was reached.
    Exhausted,
}

impl Route {
    pub const fn next_node(self) -> GraphNode {
        match self {
            Self::Accept | Self::Exhausted => GraphNode::End,
            Self::Retry => GraphNode::Retrieve,
        }
    }
}

/// Decide where to go after validation, counting failures in `retry_count`.
pub fn route_after_validation(state: &mut ConversationState, max_retries: u32) -> Route {
    if state.validation_passed {
        return Route::Accept;
    }
    state.retry_count += 1;
    if state.retry_count >= max_retries {
        Route::Exhausted
    } else {
        Route::Retry
    }
}

/// Retrieve cycles an ended invocation ran.
pub fn retrieve_cycles(state: &ConversationState) -> u32 {
    state.retry_count + u32::from(state.validation_passed)
}

/// Fresh conversation id: a UUID v4 without hyphens.
pub fn new_thread_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Graph position, carrying the value the next node consumes.
#[derive(Debug)]
enum Step {
    Retrieve,
    Generate { context: String },
    Validate { answer: String },
    End,
}

pub struct Orchestrator {
    retrieval: Arc<RetrievalSearch>,
    generator: Arc<dyn TextGenerator>,
    sessions: Arc<SessionStore>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        retrieval: Arc<RetrievalSearch>,
        generator: Arc<dyn TextGenerator>,
        sessions: Arc<SessionStore>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            retrieval,
            generator,
            sessions,
            settings,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Run the graph for `question` on `thread_id` until it ends.
    ///
    /// Invocations on the same thread run one at a time.
    #[instrument(skip(self, question), fields(thread_id = %thread_id))]
    pub async fn invoke(&self, question: &str, thread_id: &str) -> DomainResult<ConversationState> {
        let question = question.trim();
        if question.is_empty() {
            return Err(DomainError::InvalidArgument("question must not be empty".to_string()));
        }
        if thread_id.is_empty() {
            return Err(DomainError::InvalidArgument("thread_id must not be empty".to_string()));
        }

        let _guard = self.sessions.lock(thread_id).await;

        let mut state = self
            .sessions
            .get(thread_id)
            .await?
            .unwrap_or_else(|| ConversationState::new(thread_id));
        state.messages.push(ChatMessage::user(question));
        state.trim_history(self.settings.max_history_messages);
        state.retry_count = 0;
        state.validation_passed = false;
        state.answer.clear();
        state.retrieved_context.clear();
        self.checkpoint(&mut state, GraphNode::Retrieve).await?;

        let mut step = Step::Retrieve;
        loop {
            step = match step {
                Step::Retrieve => {
                    let query = state.latest_user_message().unwrap_or(question).to_string();
                    let context = self
                        .retrieval
                        .search_and_summarize(&query, self.settings.top_k)
                        .await?;
                    debug!(context_chars = context.len(), cycle = state.retry_count + 1, "retrieved context");

                    state.retrieved_context.clone_from(&context);
                    self.checkpoint(&mut state, GraphNode::Generate).await?;
                    Step::Generate { context }
                }
                Step::Generate { context } => {
                    let raw = self
                        .generator
                        .generate(&prompts::answer_prompt(&context, question))
                        .await?;
                    let answer = raw.trim().to_string();

                    state.answer.clone_from(&answer);
                    self.checkpoint(&mut state, GraphNode::Validate).await?;
                    Step::Validate { answer }
                }
                Step::Validate { answer } => {
                    let response = self
                        .generator
                        .generate(&prompts::validation_prompt(question, &answer))
                        .await?;
                    state.validation_passed = ValidationVerdict::from_response(&response).passed;

                    let route = route_after_validation(&mut state, self.settings.max_retries);
                    match route {
                        Route::Accept => debug!("answer accepted"),
                        Route::Retry => debug!(retry_count = state.retry_count, "answer rejected, retrying"),
                        Route::Exhausted => warn!(
                            retry_count = state.retry_count,
                            "answer rejected and retries exhausted; returning latest answer"
                        ),
                    }

                    if route.next_node().is_terminal() {
                        state.messages.push(ChatMessage::assistant(answer));
                        state.trim_history(self.settings.max_history_messages);
                        self.checkpoint(&mut state, GraphNode::End).await?;
                        Step::End
                    } else {
                        self.checkpoint(&mut state, GraphNode::Retrieve).await?;
                        Step::Retrieve
                    }
                }
                Step::End => break,
            };
        }

        info!(
            validated = state.validation_passed,
            cycles = retrieve_cycles(&state),
            "invocation finished"
        );
        Ok(state)
    }

    /// Request-layer entry point. Errors never escape: they are logged and
    /// turned into a degraded, unvalidated response.
    pub async fn ask(&self, question: &str, thread_id: Option<String>) -> AskResponse {
        let thread_id = thread_id
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(new_thread_id);

        match self.invoke(question, &thread_id).await {
            Ok(state) => AskResponse {
                retrieve_cycles: retrieve_cycles(&state),
                thread_id,
                answer: state.answer,
                validated: state.validation_passed,
                error: None,
            },
            Err(err) => {
                error!(thread_id = %thread_id, kind = err.kind(), error = %err, "invocation aborted");
                AskResponse {
                    thread_id,
                    answer: DEGRADED_ANSWER.to_string(),
                    validated: false,
                    retrieve_cycles: 0,
                    error: Some(AskError {
                        kind: err.kind().to_string(),
                        message: err.to_string(),
                    }),
                }
            }
        }
    }

    async fn checkpoint(&self, state: &mut ConversationState, next: GraphNode) -> DomainResult<()> {
        state.advance(next);
        let thread_id = state.thread_id.clone();
        self.sessions.put(&thread_id, state).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_accepts_passed() {
        let mut state = ConversationState::new("t");
        state.validation_passed = true;
        assert_eq!(route_after_validation(&mut state, 3), Route::Accept);
        assert_eq!(state.retry_count, 0);
    }

    #[test]
    fn test_route_retries_until_cap() {
        let mut state = ConversationState::new("t");
        assert_eq!(route_after_validation(&mut state, 3), Route::Retry);
        assert_eq!(route_after_validation(&mut state, 3), Route::Retry);
        assert_eq!(route_after_validation(&mut state, 3), Route::Exhausted);
        assert_eq!(state.retry_count, 3);
        assert_eq!(retrieve_cycles(&state), 3);
    }

    #[test]
    fn test_route_next_nodes() {
        assert_eq!(Route::Accept.next_node(), GraphNode::End);
        assert_eq!(Route::Exhausted.next_node(), GraphNode::End);
        assert_eq!(Route::Retry.next_node(), GraphNode::Retrieve);
    }

    #[test]
    fn test_retrieve_cycles_counts_accepting_cycle() {
        let mut state = ConversationState::new("t");
        state.retry_count = 1;
        state.validation_passed = true;
        assert_eq!(retrieve_cycles(&state), 2);
    }

    #[test]
    fn test_new_thread_id_is_simple_uuid() {
        let id = new_thread_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, new_thread_id());
    }
}
