//! Filesystem document loader.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::Document;
use crate::domain::ports::DocumentLoader;

use super::chunker::Chunker;

/// Metadata key holding the file path relative to the indexed folder.
pub const SOURCE_KEY: &str = "source";

/// Metadata key holding the passage position inside its file.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// Loads text files under a folder and splits them into passages.
///
/// Files are visited in path order so document ids are stable across runs.
/// Hidden entries and files with other extensions are skipped.
#[derive(Debug, Clone)]
pub struct FilesystemLoader {
    chunker: Chunker,
    extensions: Vec<String>,
}

impl FilesystemLoader {
    pub fn new(chunker: Chunker, extensions: Vec<String>) -> Self {
        let extensions = extensions
            .into_iter()
            .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Self { chunker, extensions }
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| self.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)))
    }

    fn load_blocking(&self, root: &Path) -> DomainResult<Vec<Document>> {
        if !root.exists() {
            return Err(DomainError::NotFound(format!("folder {} does not exist", root.display())));
        }
        if !root.is_dir() {
            return Err(DomainError::InvalidArgument(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        let mut files = Vec::new();
        self.collect_files(root, &mut files)?;
        files.sort();

        let mut documents = Vec::new();
        for file in files {
            let text = match std::fs::read_to_string(&file) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "skipping unreadable file");
                    continue;
                }
            };

            let source = file
                .strip_prefix(root)
                .unwrap_or(&file)
                .to_string_lossy()
                .replace('\\', "/");

            for (chunk_index, passage) in self.chunker.split(&text).into_iter().enumerate() {
                documents.push(
                    Document::new(format!("{source}#{chunk_index}"), passage)
                        .with_metadata(SOURCE_KEY, source.clone())
                        .with_metadata(CHUNK_INDEX_KEY, chunk_index.to_string()),
                );
            }
        }

        tracing::debug!(root = %root.display(), documents = documents.len(), "loaded documents");
        Ok(documents)
    }

    fn collect_files(&self, dir: &Path, files: &mut Vec<PathBuf>) -> DomainResult<()> {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let hidden = entry.file_name().to_string_lossy().starts_with('.');
            if hidden {
                continue;
            }

            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.collect_files(&path, files)?;
            } else if file_type.is_file() && self.accepts(&path) {
                files.push(path);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentLoader for FilesystemLoader {
    async fn load(&self, root: &Path) -> DomainResult<Vec<Document>> {
        let loader = self.clone();
        let root = root.to_path_buf();
        tokio::task::spawn_blocking(move || loader.load_blocking(&root))
            .await
            .map_err(|e| DomainError::Storage(format!("document loading task failed: {e}")))?
    }
}
