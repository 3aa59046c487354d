/// Session repository port for conversation checkpoints.
///
/// Services depend on this trait, not on concrete storage.
use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ConversationState, ThreadSummary};

/// Durable keyed storage of conversation state.
///
/// Implementations keep one record per thread id and overwrite it on save.
/// Concurrency control across invocations lives in the session store service.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Load the latest checkpoint for a thread.
    ///
    /// # Returns
    /// - `Some(ConversationState)` if the thread exists
    /// - `None` otherwise
    async fn load(&self, thread_id: &str) -> DomainResult<Option<ConversationState>>;

    /// Insert or replace the checkpoint for `state.thread_id`.
    async fn save(&self, state: &ConversationState) -> DomainResult<()>;

    /// Most recently updated threads first.
    async fn list_threads(&self, limit: usize) -> DomainResult<Vec<ThreadSummary>>;

    /// Remove a thread. Returns whether it existed.
    async fn delete(&self, thread_id: &str) -> DomainResult<bool>;
}
