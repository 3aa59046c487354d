//! Mock text generator for testing and offline runs.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::VERDICT_PASS;
use crate::domain::ports::TextGenerator;
use crate::services::prompts::PromptKind;

/// Scripted reply for one generation call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    /// Fail with a generation error.
    Fail { message: String, transient: bool },
    /// Sleep before answering, for timeout tests.
    Delayed(Duration, String),
}

impl MockReply {
    pub fn text(output: impl Into<String>) -> Self {
        Self::Text(output.into())
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
            transient: false,
        }
    }

    pub fn transient_failure(message: impl Into<String>) -> Self {
        Self::Fail {
            message: message.into(),
            transient: true,
        }
    }
}

type Responder = dyn Fn(&str) -> MockReply + Send + Sync;

/// Generator whose replies come from a closure over the prompt.
///
/// Every prompt is recorded so tests can count calls per prompt kind.
#[derive(Clone)]
pub struct MockGenerator {
    responder: Arc<Responder>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl std::fmt::Debug for MockGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGenerator")
            .field("calls", &self.call_count())
            .finish_non_exhaustive()
    }
}

impl MockGenerator {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str) -> MockReply + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Always reply with the same text.
    pub fn constant(output: impl Into<String>) -> Self {
        let output = output.into();
        Self::new(move |_| MockReply::Text(output.clone()))
    }

    /// Offline stand-in: answers with the start of the supplied context and
    /// accepts every answer it is asked to judge.
    pub fn offline() -> Self {
        Self::new(|prompt| match PromptKind::classify(prompt) {
            PromptKind::Validation => MockReply::text(VERDICT_PASS),
            PromptKind::Summary | PromptKind::Answer => {
                let context = PromptKind::context_of(prompt).unwrap_or_default();
                let first = context.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
                if first.is_empty() {
                    MockReply::text("I could not find relevant information in the indexed documents.")
                } else {
                    MockReply::text(first.trim())
                }
            }
            PromptKind::Other => MockReply::text("ok"),
        })
    }

    /// Prompts received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Number of recorded prompts of the given kind.
    pub fn count_kind(&self, kind: PromptKind) -> usize {
        self.calls()
            .iter()
            .filter(|p| PromptKind::classify(p) == kind)
            .count()
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, prompt: &str) -> DomainResult<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(prompt.to_string());
        }

        match (self.responder)(prompt) {
            MockReply::Text(text) => Ok(text),
            MockReply::Fail { message, transient } => Err(DomainError::Generation { message, transient }),
            MockReply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
        }
    }
}
