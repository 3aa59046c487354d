//! Exact nearest-neighbour search over a contiguous vector buffer.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Document;

/// Immutable snapshot of an index: one vector per document, row-major.
///
/// Buffers are shared, so cloning a snapshot never copies vectors or documents.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Arc<[f32]>,
    documents: Arc<[Document]>,
    generation: u64,
}

impl FlatIndex {
    /// Build from parallel vectors and documents.
    pub fn new(dimension: usize, vectors: Vec<f32>, documents: Vec<Document>) -> DomainResult<Self> {
        if dimension == 0 {
            return Err(DomainError::InvalidArgument("index dimension must be greater than 0".to_string()));
        }
        if vectors.len() != dimension * documents.len() {
            return Err(DomainError::InvalidArgument(format!(
                "{} vector components do not match {} documents of dimension {dimension}",
                vectors.len(),
                documents.len()
            )));
        }
        Ok(Self {
            dimension,
            vectors: vectors.into(),
            documents: documents.into(),
            generation: 0,
        })
    }

    pub fn empty(dimension: usize) -> DomainResult<Self> {
        Self::new(dimension, Vec::new(), Vec::new())
    }

    #[must_use]
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Persisted generation this snapshot came from; 0 when never persisted.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn vectors(&self) -> &[f32] {
        &self.vectors
    }

    pub fn document(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    /// The `top_k` nearest entries as `(ordinal, squared L2 distance)`,
    /// ordered by distance then ordinal.
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<(usize, f32)> {
        if self.is_empty() || top_k == 0 || query.len() != self.dimension {
            return Vec::new();
        }

        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(i, row)| (i, squared_l2(query, row)))
            .collect();

        let by_distance = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
        };

        if top_k < scored.len() {
            scored.select_nth_unstable_by(top_k - 1, by_distance);
            scored.truncate(top_k);
        }
        scored.sort_by(by_distance);
        scored
    }
}

/// Squared Euclidean distance, saturating at `f32::MAX`.
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    let sum: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
    if sum.is_finite() {
        sum
    } else {
        f32::MAX
    }
}
