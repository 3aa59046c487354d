//! Keyed conversation checkpoints with per-thread serialisation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ConversationState, ThreadSummary};
use crate::domain::ports::SessionRepository;
use crate::infrastructure::deadline::with_timeout;

/// Held for the duration of one invocation on a thread.
pub type ThreadGuard = OwnedMutexGuard<()>;

pub struct SessionStore {
    repository: Arc<dyn SessionRepository>,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
    timeout: Duration,
}

impl SessionStore {
    pub fn new(repository: Arc<dyn SessionRepository>, timeout: Duration) -> Self {
        Self {
            repository,
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    pub async fn get(&self, thread_id: &str) -> DomainResult<Option<ConversationState>> {
        with_timeout("session load", self.timeout, self.repository.load(thread_id)).await
    }

    /// Checkpoint `state` under `thread_id`.
    pub async fn put(&self, thread_id: &str, state: &ConversationState) -> DomainResult<()> {
        if state.thread_id != thread_id {
            return Err(DomainError::InvalidArgument(format!(
                "state belongs to thread {}, not {thread_id}",
                state.thread_id
            )));
        }
        with_timeout("session save", self.timeout, self.repository.save(state)).await
    }

    pub async fn list_threads(&self, limit: usize) -> DomainResult<Vec<ThreadSummary>> {
        with_timeout("session list", self.timeout, self.repository.list_threads(limit)).await
    }

    pub async fn delete(&self, thread_id: &str) -> DomainResult<bool> {
        with_timeout("session delete", self.timeout, self.repository.delete(thread_id)).await
    }

    /// Exclusive access to `thread_id` until the guard drops.
    ///
    /// Distinct threads never contend with each other.
    pub async fn lock(&self, thread_id: &str) -> ThreadGuard {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            // Entries only referenced by the map are idle.
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(locks.entry(thread_id.to_string()).or_default())
        };
        mutex.lock_owned().await
    }

    /// Number of threads with a live lock entry.
    pub fn active_locks(&self) -> usize {
        self.locks
            .lock()
            .map(|locks| locks.values().filter(|m| Arc::strong_count(m) > 1).count())
            .unwrap_or_default()
    }
}
