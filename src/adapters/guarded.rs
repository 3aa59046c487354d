//! Deadline and retry decorators for external service ports.
//!
//! Each attempt runs under its own deadline; transient failures, including
//! deadline overruns, are retried according to the [`RetryPolicy`].

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::errors::DomainResult;
use crate::domain::ports::{EmbeddingInput, EmbeddingOutput, EmbeddingProvider, TextGenerator};
use crate::infrastructure::deadline::with_timeout;
use crate::infrastructure::retry::RetryPolicy;

/// [`TextGenerator`] wrapper adding a per-call deadline and bounded retries.
pub struct GuardedGenerator {
    inner: Arc<dyn TextGenerator>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl GuardedGenerator {
    pub fn new(inner: Arc<dyn TextGenerator>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self { inner, timeout, retry }
    }
}

#[async_trait]
impl TextGenerator for GuardedGenerator {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn generate(&self, prompt: &str) -> DomainResult<String> {
        self.retry
            .execute("generate", || {
                with_timeout("generate", self.timeout, self.inner.generate(prompt))
            })
            .await
    }
}

/// [`EmbeddingProvider`] wrapper adding a per-call deadline and bounded retries.
pub struct GuardedEmbedder {
    inner: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl GuardedEmbedder {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, timeout: Duration, retry: RetryPolicy) -> Self {
        Self { inner, timeout, retry }
    }
}

#[async_trait]
impl EmbeddingProvider for GuardedEmbedder {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        self.retry
            .execute("embed", || with_timeout("embed", self.timeout, self.inner.embed(text)))
            .await
    }

    async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
        self.retry
            .execute("embed_batch", || {
                with_timeout("embed_batch", self.timeout, self.inner.embed_batch(inputs))
            })
            .await
    }

    fn max_batch_size(&self) -> usize {
        self.inner.max_batch_size()
    }
}
