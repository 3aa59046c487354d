//! Character-window text chunking.
//!
//! Splits text into passages of at most `chunk_size` characters, preferring
//! to end on a sentence or line boundary, with `chunk_overlap` characters
//! carried into the next passage.

use crate::domain::errors::{DomainError, DomainResult};

const BOUNDARIES: [char; 4] = ['.', '!', '?', '\n'];

#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> DomainResult<Self> {
        if chunk_size == 0 {
            return Err(DomainError::Configuration("chunk_size must be greater than 0".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(DomainError::Configuration(
                "chunk_overlap must be less than chunk_size".to_string(),
            ));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    /// Split `text` into non-empty trimmed passages.
    pub fn split(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.trim().chars().collect();
        if chars.is_empty() {
            return Vec::new();
        }
        if chars.len() <= self.chunk_size {
            return vec![chars.into_iter().collect()];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < chars.len() {
            let mut end = (start + self.chunk_size).min(chars.len());

            if end < chars.len() {
                if let Some(boundary) = self.snap_to_boundary(&chars[start..end]) {
                    end = start + boundary;
                }
            }

            let chunk: String = chars[start..end].iter().collect();
            let chunk = chunk.trim();
            if !chunk.is_empty() {
                chunks.push(chunk.to_string());
            }

            if end >= chars.len() {
                break;
            }
            start = end.saturating_sub(self.chunk_overlap).max(start + 1);
        }

        chunks
    }

    /// Length of the window up to its last boundary, ignoring boundaries in
    /// the first half so passages stay reasonably long.
    fn snap_to_boundary(&self, window: &[char]) -> Option<usize> {
        let min_len = self.chunk_size / 2;
        window
            .iter()
            .rposition(|c| BOUNDARIES.contains(c))
            .map(|i| i + 1)
            .filter(|len| *len > min_len && *len > self.chunk_overlap)
    }
}
