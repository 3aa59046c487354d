//! Document source port.

use async_trait::async_trait;
use std::path::Path;

use crate::domain::errors::DomainResult;
use crate::domain::models::Document;

/// Reads source material into indexable documents.
#[async_trait]
pub trait DocumentLoader: Send + Sync {
    /// Load every document under `root`, in a deterministic order.
    async fn load(&self, root: &Path) -> DomainResult<Vec<Document>>;
}
