//! SQLite implementation of the SessionRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ConversationState, GraphNode, ThreadSummary};
use crate::domain::ports::SessionRepository;

use super::parse_datetime;

#[derive(Clone)]
pub struct SqliteSessionRepository {
    pool: SqlitePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for SqliteSessionRepository {
    async fn load(&self, thread_id: &str) -> DomainResult<Option<ConversationState>> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT state FROM conversation_checkpoints WHERE thread_id = ?")
                .bind(thread_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(json,)| serde_json::from_str(&json).map_err(DomainError::from))
            .transpose()
    }

    async fn save(&self, state: &ConversationState) -> DomainResult<()> {
        let state_json = serde_json::to_string(state)?;
        let step = i64::try_from(state.step)
            .map_err(|_| DomainError::InvalidArgument(format!("step {} out of range", state.step)))?;
        let message_count = i64::try_from(state.messages.len()).unwrap_or(i64::MAX);

        sqlx::query(
            r"INSERT INTO conversation_checkpoints (thread_id, state, step, next_node, message_count, created_at, updated_at)
              VALUES (?, ?, ?, ?, ?, ?, ?)
              ON CONFLICT(thread_id) DO UPDATE SET
                state = excluded.state,
                step = excluded.step,
                next_node = excluded.next_node,
                message_count = excluded.message_count,
                updated_at = excluded.updated_at",
        )
        .bind(&state.thread_id)
        .bind(&state_json)
        .bind(step)
        .bind(state.next_node.as_str())
        .bind(message_count)
        .bind(state.created_at.to_rfc3339())
        .bind(state.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_threads(&self, limit: usize) -> DomainResult<Vec<ThreadSummary>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows: Vec<ThreadRow> = sqlx::query_as(
            r"SELECT thread_id, step, next_node, message_count, updated_at
              FROM conversation_checkpoints
              ORDER BY updated_at DESC, thread_id ASC
              LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ThreadSummary::try_from).collect()
    }

    async fn delete(&self, thread_id: &str) -> DomainResult<bool> {
        let result = sqlx::query("DELETE FROM conversation_checkpoints WHERE thread_id = ?")
            .bind(thread_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct ThreadRow {
    thread_id: String,
    step: i64,
    next_node: String,
    message_count: i64,
    updated_at: String,
}

impl TryFrom<ThreadRow> for ThreadSummary {
    type Error = DomainError;

    fn try_from(row: ThreadRow) -> Result<Self, Self::Error> {
        let next_node = match row.next_node.as_str() {
            "retrieve" => GraphNode::Retrieve,
            "generate" => GraphNode::Generate,
            "validate" => GraphNode::Validate,
            "end" => GraphNode::End,
            other => {
                return Err(DomainError::SerializationError(format!("unknown graph node: {other}")))
            }
        };

        Ok(Self {
            thread_id: row.thread_id,
            message_count: usize::try_from(row.message_count).unwrap_or_default(),
            step: u64::try_from(row.step).unwrap_or_default(),
            next_node,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}
