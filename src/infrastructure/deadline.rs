//! Deadlines for blocking I/O boundaries.

use std::future::Future;
use std::time::Duration;

use crate::domain::errors::{DomainError, DomainResult};

/// Await `fut`, failing with [`DomainError::Timeout`] once `limit` elapses.
pub async fn with_timeout<T, Fut>(operation: &str, limit: Duration, fut: Fut) -> DomainResult<T>
where
    Fut: Future<Output = DomainResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            let elapsed_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(operation, elapsed_ms, "operation exceeded its deadline");
            Err(DomainError::Timeout {
                operation: operation.to_string(),
                elapsed_ms,
            })
        }
    }
}
