//! Rebuildable nearest-neighbour index over embedded documents.
//!
//! One long-lived instance is shared through `Arc`. Queries read an immutable
//! snapshot; `build` and `load` prepare a new snapshot and swap it in, and a
//! writer mutex keeps `build`, `persist` and `load` from interleaving.

pub mod flat;
pub mod storage;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Document, QueryHit, QueryResult};
use crate::domain::ports::{check_vector, EmbeddingInput, EmbeddingProvider};
use crate::infrastructure::deadline::with_timeout;

pub use flat::FlatIndex;

/// Embedding batches in flight during a build.
const EMBED_CONCURRENCY: usize = 4;

/// Summary of the live snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexStats {
    pub ready: bool,
    pub documents: usize,
    pub dimension: usize,
    pub generation: u64,
}

pub struct VectorIndex {
    embedder: Arc<dyn EmbeddingProvider>,
    snapshot: RwLock<Option<Arc<FlatIndex>>>,
    writer: Arc<Mutex<()>>,
    storage_timeout: Duration,
}

impl VectorIndex {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, storage_timeout: Duration) -> Self {
        Self {
            embedder,
            snapshot: RwLock::new(None),
            writer: Arc::new(Mutex::new(())),
            storage_timeout,
        }
    }

    async fn current(&self) -> Option<Arc<FlatIndex>> {
        self.snapshot.read().await.clone()
    }

    /// Embed `documents` and replace the live index with them.
    ///
    /// The previous index stays live until embedding has succeeded.
    #[instrument(skip(self, documents), fields(documents = documents.len()))]
    pub async fn build(&self, documents: Vec<Document>) -> DomainResult<()> {
        let _writer = self.writer.lock().await;

        let dimension = self.embedder.dimension();
        let vectors = self.embed_documents(&documents, dimension).await?;
        let index = FlatIndex::new(dimension, vectors, documents)?;

        info!(documents = index.len(), dimension, "index built");
        *self.snapshot.write().await = Some(Arc::new(index));
        Ok(())
    }

    async fn embed_documents(&self, documents: &[Document], dimension: usize) -> DomainResult<Vec<f32>> {
        let mut vectors = Vec::with_capacity(documents.len() * dimension);
        let batch_size = self.embedder.max_batch_size().max(1);
        let embedder = &self.embedder;

        let batches: Vec<Vec<EmbeddingInput>> = documents
            .chunks(batch_size)
            .map(|batch| {
                batch
                    .iter()
                    .map(|d| EmbeddingInput {
                        id: d.id.clone(),
                        text: d.text.clone(),
                    })
                    .collect()
            })
            .collect();

        // Batches are embedded concurrently but consumed in input order.
        let mut embedded = stream::iter(batches)
            .map(|inputs| async move {
                let outputs = embedder.embed_batch(&inputs).await?;
                Ok::<_, DomainError>((inputs, outputs))
            })
            .buffered(EMBED_CONCURRENCY);

        while let Some(batch) = embedded.next().await {
            let (inputs, outputs) = batch?;
            if outputs.len() != inputs.len() {
                return Err(DomainError::embedding(format!(
                    "embedding service returned {} vectors for {} documents",
                    outputs.len(),
                    inputs.len()
                )));
            }

            for (input, output) in inputs.iter().zip(outputs) {
                if output.id != input.id {
                    return Err(DomainError::embedding(format!(
                        "embedding for {} returned out of order",
                        input.id
                    )));
                }
                check_vector(&output.vector, dimension)?;
                vectors.extend_from_slice(&output.vector);
            }
            debug!(embedded = vectors.len() / dimension, "embedded batch");
        }

        Ok(vectors)
    }

    /// Write the live index under `path` as a new generation.
    ///
    /// The writer lock travels with the disk work: when the deadline passes
    /// the caller gets `Timeout`, but later writers still wait for the
    /// abandoned write to finish.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn persist(&self, path: &Path) -> DomainResult<u64> {
        let writer = Arc::clone(&self.writer).lock_owned().await;
        let index = self.current().await.ok_or(DomainError::IndexNotReady)?;

        let dir = path.to_path_buf();
        let snapshot = Arc::clone(&index);
        let task = tokio::task::spawn_blocking(move || (storage::write_index(&dir, &snapshot), writer));
        let (generation, _writer) = with_timeout("index persist", self.storage_timeout, async move {
            let (written, writer) = task
                .await
                .map_err(|e| DomainError::Storage(format!("index persist task failed: {e}")))?;
            written.map(|generation| (generation, writer))
        })
        .await?;

        // Buffers are shared, so stamping the generation copies no data.
        let persisted = Arc::new((*index).clone().with_generation(generation));
        *self.snapshot.write().await = Some(persisted);

        info!(generation, documents = index.len(), "index persisted");
        Ok(generation)
    }

    /// Replace the live index with the one persisted under `path`.
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub async fn load(&self, path: &Path) -> DomainResult<()> {
        let writer = Arc::clone(&self.writer).lock_owned().await;

        let dir: PathBuf = path.to_path_buf();
        let task = tokio::task::spawn_blocking(move || (storage::read_index(&dir), writer));
        let (index, _writer) = with_timeout("index load", self.storage_timeout, async move {
            let (read, writer) = task
                .await
                .map_err(|e| DomainError::Storage(format!("index load task failed: {e}")))?;
            read.map(|index| (index, writer))
        })
        .await?;

        let expected = self.embedder.dimension();
        if index.dimension() != expected {
            return Err(DomainError::CorruptIndex {
                path: path.display().to_string(),
                reason: format!(
                    "index dimension {} does not match embedder dimension {expected}",
                    index.dimension()
                ),
            });
        }

        info!(generation = index.generation(), documents = index.len(), "index loaded");
        *self.snapshot.write().await = Some(Arc::new(index));
        Ok(())
    }

    /// The `top_k` nearest documents to `text`, nearest first.
    #[instrument(skip(self, text))]
    pub async fn query(&self, text: &str, top_k: usize) -> DomainResult<QueryResult> {
        if top_k == 0 {
            return Err(DomainError::InvalidArgument("top_k must be greater than 0".to_string()));
        }
        let index = self.current().await.ok_or(DomainError::IndexNotReady)?;
        if index.is_empty() {
            return Ok(QueryResult::empty());
        }

        let embedding = self.embedder.embed(text).await?;
        check_vector(&embedding, index.dimension())?;

        let hits = index
            .search(&embedding, top_k)
            .into_iter()
            .enumerate()
            .filter_map(|(rank, (ordinal, distance))| {
                index.document(ordinal).map(|doc| QueryHit {
                    rank,
                    index: ordinal,
                    distance,
                    metadata: doc.hit_metadata(),
                })
            })
            .collect();

        Ok(QueryResult { hits })
    }

    pub async fn is_ready(&self) -> bool {
        self.snapshot.read().await.is_some()
    }

    pub async fn len(&self) -> usize {
        self.current().await.map_or(0, |i| i.len())
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub fn dimension(&self) -> usize {
        self.embedder.dimension()
    }

    pub async fn generation(&self) -> u64 {
        self.current().await.map_or(0, |i| i.generation())
    }

    pub async fn stats(&self) -> IndexStats {
        let current = self.current().await;
        IndexStats {
            ready: current.is_some(),
            documents: current.as_ref().map_or(0, |i| i.len()),
            dimension: current.as_ref().map_or_else(|| self.dimension(), |i| i.dimension()),
            generation: current.as_ref().map_or(0, |i| i.generation()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embeddings::HashingEmbeddingProvider;
    use async_trait::async_trait;
    use crate::domain::ports::EmbeddingOutput;

    fn index() -> VectorIndex {
        VectorIndex::new(
            Arc::new(HashingEmbeddingProvider::new(64).unwrap()),
            Duration::from_secs(5),
        )
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::new("sql", "SQL injection inserts malicious SQL statements into queries."),
            Document::new("xss", "Cross-site scripting injects scripts into web pages."),
            Document::new("bio", "Photosynthesis converts light energy into chemical energy."),
        ]
    }

    #[tokio::test]
    async fn test_query_before_build_is_not_ready() {
        let err = index().query("anything", 3).await.unwrap_err();
        assert!(matches!(err, DomainError::IndexNotReady));
    }

    #[tokio::test]
    async fn test_zero_top_k_rejected() {
        let idx = index();
        idx.build(corpus()).await.unwrap();
        assert!(matches!(idx.query("sql", 0).await, Err(DomainError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_query_ranks_relevant_document_first() {
        let idx = index();
        idx.build(corpus()).await.unwrap();

        let result = idx.query("what is SQL injection", 2).await.unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.hits[0].document_id(), Some("sql"));
        assert_eq!(result.hits[0].rank, 0);
        assert!(result.is_sorted_by_distance());
    }

    #[tokio::test]
    async fn test_empty_build_gives_empty_results() {
        let idx = index();
        idx.build(Vec::new()).await.unwrap();
        assert!(idx.is_ready().await);
        assert!(idx.query("x", 3).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persist_requires_ready_index() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(index().persist(dir.path()).await, Err(DomainError::IndexNotReady)));
    }

    struct WrongDimension;

    #[async_trait]
    impl EmbeddingProvider for WrongDimension {
        fn name(&self) -> &'static str {
            "wrong"
        }
        fn dimension(&self) -> usize {
            4
        }
        async fn embed(&self, _text: &str) -> DomainResult<Vec<f32>> {
            Ok(vec![0.0; 3])
        }
        async fn embed_batch(&self, inputs: &[EmbeddingInput]) -> DomainResult<Vec<EmbeddingOutput>> {
            Ok(inputs
                .iter()
                .map(|i| EmbeddingOutput { id: i.id.clone(), vector: vec![0.0; 3] })
                .collect())
        }
        fn max_batch_size(&self) -> usize {
            8
        }
    }

    #[tokio::test]
    async fn test_dimension_mismatch_fails_build_and_keeps_previous() {
        let idx = VectorIndex::new(Arc::new(WrongDimension), Duration::from_secs(1));
        let err = idx.build(corpus()).await.unwrap_err();
        assert!(matches!(err, DomainError::Embedding { .. }));
        assert!(!idx.is_ready().await);
    }
}
