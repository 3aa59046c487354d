//! In-memory SessionRepository for tests and ephemeral runs.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ConversationState, ThreadSummary};
use crate::domain::ports::SessionRepository;

#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    states: RwLock<HashMap<String, ConversationState>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn load(&self, thread_id: &str) -> DomainResult<Option<ConversationState>> {
        Ok(self.states.read().await.get(thread_id).cloned())
    }

    async fn save(&self, state: &ConversationState) -> DomainResult<()> {
        self.states
            .write()
            .await
            .insert(state.thread_id.clone(), state.clone());
        Ok(())
    }

    async fn list_threads(&self, limit: usize) -> DomainResult<Vec<ThreadSummary>> {
        let states = self.states.read().await;
        let mut summaries: Vec<ThreadSummary> = states.values().map(ThreadSummary::from).collect();
        summaries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| a.thread_id.cmp(&b.thread_id))
        });
        summaries.truncate(limit);
        Ok(summaries)
    }

    async fn delete(&self, thread_id: &str) -> DomainResult<bool> {
        Ok(self.states.write().await.remove(thread_id).is_some())
    }
}
