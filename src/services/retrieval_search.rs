//! Turns a question into a context block for answer generation.

use std::sync::Arc;
use tracing::{debug, instrument};

use crate::domain::errors::DomainResult;
use crate::domain::models::{QueryResult, RetrievalConfig};
use crate::domain::ports::TextGenerator;

use super::prompts;
use super::vector_index::VectorIndex;

/// Separator between passages in a context block.
pub const PASSAGE_SEPARATOR: &str = "\n\n";

/// Limits applied when folding passages into one context block.
#[derive(Debug, Clone)]
pub struct RetrievalSettings {
    pub max_passages: usize,
    pub max_context_chars: usize,
    pub summarize: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self::from(&RetrievalConfig::default())
    }
}

impl From<&RetrievalConfig> for RetrievalSettings {
    fn from(config: &RetrievalConfig) -> Self {
        Self {
            max_passages: config.max_passages,
            max_context_chars: config.max_context_chars,
            summarize: config.summarize,
        }
    }
}

pub struct RetrievalSearch {
    index: Arc<VectorIndex>,
    generator: Arc<dyn TextGenerator>,
    settings: RetrievalSettings,
}

impl RetrievalSearch {
    pub fn new(index: Arc<VectorIndex>, generator: Arc<dyn TextGenerator>, settings: RetrievalSettings) -> Self {
        Self {
            index,
            generator,
            settings,
        }
    }

    /// Raw ranked hits for `query`.
    pub async fn search(&self, query: &str, top_k: usize) -> DomainResult<QueryResult> {
        self.index.query(query, top_k).await
    }

    /// Retrieve the `top_k` nearest passages and condense them into a context
    /// block. Returns an empty string when nothing matches.
    #[instrument(skip(self, query))]
    pub async fn search_and_summarize(&self, query: &str, top_k: usize) -> DomainResult<String> {
        let result = self.index.query(query, top_k).await?;
        if result.is_empty() {
            debug!("no passages matched");
            return Ok(String::new());
        }

        let context = self.fold_passages(&result);
        if !self.settings.summarize || context.is_empty() {
            return Ok(context);
        }

        let summary = self
            .generator
            .generate(&prompts::summary_prompt(&context, query))
            .await?;
        let summary = summary.trim();
        if summary.is_empty() {
            debug!("empty summary, using raw passages");
            return Ok(context);
        }
        Ok(summary.to_string())
    }

    /// Join passages in rank order within the passage and character budgets.
    fn fold_passages(&self, result: &QueryResult) -> String {
        let mut context = String::new();
        let mut used_chars = 0;

        for hit in result.iter().take(self.settings.max_passages) {
            let passage = hit.text().trim();
            if passage.is_empty() {
                continue;
            }

            let separator_chars = if context.is_empty() { 0 } else { PASSAGE_SEPARATOR.len() };
            let remaining = self.settings.max_context_chars.saturating_sub(used_chars + separator_chars);
            if remaining == 0 {
                break;
            }

            if !context.is_empty() {
                context.push_str(PASSAGE_SEPARATOR);
            }
            let taken: String = passage.chars().take(remaining).collect();
            used_chars += separator_chars + taken.chars().count();
            context.push_str(&taken);
        }

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::embeddings::HashingEmbeddingProvider;
    use crate::adapters::generation::MockGenerator;
    use crate::domain::errors::DomainError;
    use crate::domain::models::Document;
    use crate::services::prompts::PromptKind;
    use std::time::Duration;

    async fn built_index(docs: Vec<Document>) -> Arc<VectorIndex> {
        let index = Arc::new(VectorIndex::new(
            Arc::new(HashingEmbeddingProvider::new(128).unwrap()),
            Duration::from_secs(5),
        ));
        index.build(docs).await.unwrap();
        index
    }

    fn raw_settings() -> RetrievalSettings {
        RetrievalSettings {
            summarize: false,
            ..RetrievalSettings::default()
        }
    }

    #[tokio::test]
    async fn test_passages_joined_in_rank_order() {
        let index = built_index(vec![
            Document::new("a", "SQL injection abuses SQL queries."),
            Document::new("b", "Gardening tips for spring."),
            Document::new("c", "Prevent SQL injection with parameterized queries."),
        ])
        .await;
        let generator = MockGenerator::constant("unused");
        let search = RetrievalSearch::new(index, Arc::new(generator.clone()), raw_settings());

        let context = search.search_and_summarize("SQL injection queries", 2).await.unwrap();
        let passages: Vec<&str> = context.split(PASSAGE_SEPARATOR).collect();
        assert_eq!(passages.len(), 2);
        assert!(passages.iter().all(|p| p.contains("SQL")));
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_hits_returns_empty_without_generation() {
        let index = built_index(Vec::new()).await;
        let generator = MockGenerator::constant("summary");
        let search = RetrievalSearch::new(index, Arc::new(generator.clone()), RetrievalSettings::default());

        assert_eq!(search.search_and_summarize("anything", 3).await.unwrap(), "");
        assert_eq!(generator.call_count(), 0);
    }

    #[tokio::test]
    async fn test_summary_replaces_passages() {
        let index = built_index(vec![Document::new("a", "SQL injection abuses SQL queries.")]).await;
        let generator = MockGenerator::constant("  condensed  ");
        let search = RetrievalSearch::new(index, Arc::new(generator.clone()), RetrievalSettings::default());

        assert_eq!(search.search_and_summarize("sql", 3).await.unwrap(), "condensed");
        assert_eq!(generator.count_kind(PromptKind::Summary), 1);
    }

    #[tokio::test]
    async fn test_empty_summary_falls_back_to_passages() {
        let index = built_index(vec![Document::new("a", "SQL injection abuses SQL queries.")]).await;
        let search = RetrievalSearch::new(index, Arc::new(MockGenerator::constant("   ")), RetrievalSettings::default());

        assert_eq!(
            search.search_and_summarize("sql", 3).await.unwrap(),
            "SQL injection abuses SQL queries."
        );
    }

    #[tokio::test]
    async fn test_character_budget() {
        let index = built_index(vec![
            Document::new("a", "alpha ".repeat(20)),
            Document::new("b", "alpha beta ".repeat(20)),
        ])
        .await;
        let settings = RetrievalSettings {
            max_passages: 3,
            max_context_chars: 30,
            summarize: false,
        };
        let search = RetrievalSearch::new(index, Arc::new(MockGenerator::constant("")), settings);

        let context = search.search_and_summarize("alpha", 3).await.unwrap();
        assert!(context.chars().count() <= 30);
        assert!(!context.is_empty());
    }

    #[tokio::test]
    async fn test_not_ready_propagates() {
        let index = Arc::new(VectorIndex::new(
            Arc::new(HashingEmbeddingProvider::new(8).unwrap()),
            Duration::from_secs(1),
        ));
        let search = RetrievalSearch::new(index, Arc::new(MockGenerator::constant("")), raw_settings());
        assert!(matches!(
            search.search_and_summarize("q", 3).await,
            Err(DomainError::IndexNotReady)
        ));
    }
}
