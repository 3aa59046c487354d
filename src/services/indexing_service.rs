//! Build-index request operation: load a folder, embed it, persist it.

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::adapters::loader::SOURCE_KEY;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::DocumentLoader;

use super::vector_index::VectorIndex;

/// Outcome of indexing a folder.
#[derive(Debug, Clone, Serialize)]
pub struct IndexReport {
    pub folder: PathBuf,
    pub index_path: PathBuf,
    /// Passages per source file, in path order.
    pub files: BTreeMap<String, usize>,
    pub passages: usize,
    pub generation: u64,
}

impl IndexReport {
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

pub struct IndexingService {
    loader: Arc<dyn DocumentLoader>,
    index: Arc<VectorIndex>,
    index_path: PathBuf,
}

impl IndexingService {
    pub fn new(loader: Arc<dyn DocumentLoader>, index: Arc<VectorIndex>, index_path: impl Into<PathBuf>) -> Self {
        Self {
            loader,
            index,
            index_path: index_path.into(),
        }
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Replace the index with the contents of `folder` and persist it.
    ///
    /// A missing folder or a non-directory path fails before the live index
    /// is touched.
    #[instrument(skip(self, folder), fields(folder = %folder.display()))]
    pub async fn build_from_folder(&self, folder: &Path) -> DomainResult<IndexReport> {
        if !folder.exists() {
            return Err(DomainError::NotFound(format!("folder {} does not exist", folder.display())));
        }
        if !folder.is_dir() {
            return Err(DomainError::InvalidArgument(format!(
                "{} is not a directory",
                folder.display()
            )));
        }

        let documents = self.loader.load(folder).await?;

        let mut files = BTreeMap::new();
        for doc in &documents {
            let source = doc.metadata.get(SOURCE_KEY).cloned().unwrap_or_else(|| doc.id.clone());
            *files.entry(source).or_insert(0) += 1;
        }
        let passages = documents.len();

        self.index.build(documents).await?;
        let generation = self.index.persist(&self.index_path).await?;

        info!(files = files.len(), passages, generation, "folder indexed");
        Ok(IndexReport {
            folder: folder.to_path_buf(),
            index_path: self.index_path.clone(),
            files,
            passages,
            generation,
        })
    }

    /// Load the persisted index if one exists. Returns whether it was loaded.
    pub async fn load_existing(&self) -> DomainResult<bool> {
        match self.index.load(&self.index_path).await {
            Ok(()) => Ok(true),
            Err(DomainError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
