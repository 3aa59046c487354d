//! Generative text service port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;

/// A service that completes a single prompt into text.
///
/// Used for answer drafting, context condensing and answer judging.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend name (e.g., "gemini", "mock").
    fn name(&self) -> &'static str;

    /// Complete `prompt` and return the generated text.
    async fn generate(&self, prompt: &str) -> DomainResult<String>;
}
