//! Common test utilities for integration tests
//!
//! Shared corpus, configuration and generator fixtures used across the
//! integration test files.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

use ragguard::adapters::embeddings::HashingEmbeddingProvider;
use ragguard::adapters::generation::{MockGenerator, MockReply};
use ragguard::adapters::InMemorySessionRepository;
use ragguard::domain::models::{EmbeddingBackend, GenerationProvider};
use ragguard::domain::ports::SessionRepository;
use ragguard::infrastructure::AppServices;
use ragguard::services::prompts::PromptKind;
use ragguard::{Config, Document, VectorIndex};

pub const EMBEDDING_DIMENSION: usize = 1024;

pub const SQL_INJECTION: &str = "SQL injection inserts malicious SQL statements into application queries. \
     Prevent SQL injection with parameterized queries and prepared statements.";
pub const XSS: &str = "Cross-site scripting (XSS) runs attacker scripts inside victim browsers. \
     Escape output and deploy a content security policy.";
pub const CSRF: &str = "Cross-site request forgery (CSRF) tricks authenticated browsers into sending unwanted requests. \
     Anti-forgery tokens and SameSite cookies stop it.";
pub const PHOTOSYNTHESIS: &str = "Photosynthesis converts light energy into chemical energy stored in glucose.";
pub const TIDES: &str = "Ocean tides follow the gravitational pull of the moon and the sun.";

/// The test corpus as `(file name, text)` pairs.
pub fn corpus() -> Vec<(&'static str, &'static str)> {
    vec![
        ("csrf.txt", CSRF),
        ("photosynthesis.md", PHOTOSYNTHESIS),
        ("sql_injection.txt", SQL_INJECTION),
        ("tides.txt", TIDES),
        ("xss.md", XSS),
    ]
}

/// The corpus as in-memory documents, one passage per file.
pub fn corpus_documents() -> Vec<Document> {
    corpus()
        .into_iter()
        .map(|(name, text)| Document::new(format!("{name}#0"), text).with_metadata("source", name))
        .collect()
}

/// Create a temporary directory holding the corpus files.
pub fn write_corpus() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    for (name, text) in corpus() {
        std::fs::write(dir.path().join(name), text).expect("Failed to write corpus file");
    }
    dir
}

/// Offline configuration rooted in `dir`, with fast retries.
pub fn test_config(dir: &Path) -> Config {
    let mut config = Config::default();
    config.generation.provider = GenerationProvider::Mock;
    config.embedding.provider = EmbeddingBackend::Hashing;
    config.embedding.dimension = EMBEDDING_DIMENSION;
    config.index.path = dir.join("index").display().to_string();
    config.database.path = dir.join("sessions.db").display().to_string();
    config.retry.max_retries = 0;
    config.retry.initial_backoff_ms = 1;
    config.retry.max_backoff_ms = 1;
    config
}

pub fn hashing_embedder() -> Arc<HashingEmbeddingProvider> {
    Arc::new(HashingEmbeddingProvider::new(EMBEDDING_DIMENSION).expect("valid dimension"))
}

/// A vector index over the hashing embedder.
pub fn vector_index() -> VectorIndex {
    VectorIndex::new(hashing_embedder(), Duration::from_secs(5))
}

/// First non-empty line of the context embedded in an answer or summary prompt.
pub fn echo_context(prompt: &str) -> String {
    PromptKind::context_of(prompt)
        .and_then(|c| c.lines().find(|l| !l.trim().is_empty()))
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| "No relevant information found.".to_string())
}

/// Generator that echoes retrieved context and answers every judgment with `verdict`.
pub fn judge_always(verdict: &'static str) -> MockGenerator {
    MockGenerator::new(move |prompt| match PromptKind::classify(prompt) {
        PromptKind::Validation => MockReply::text(verdict),
        _ => MockReply::text(echo_context(prompt)),
    })
}

/// Wire services over an in-memory session store with `generator`.
pub fn services_with(config: &Config, generator: MockGenerator) -> AppServices {
    services_with_repository(config, generator, Arc::new(InMemorySessionRepository::new()))
}

pub fn services_with_repository(
    config: &Config,
    generator: MockGenerator,
    repository: Arc<dyn SessionRepository>,
) -> AppServices {
    AppServices::with_components(config, hashing_embedder(), Arc::new(generator), repository)
        .expect("Failed to wire services")
}

/// Services with the corpus already indexed in memory.
pub async fn indexed_services(config: &Config, generator: MockGenerator) -> AppServices {
    let services = services_with(config, generator);
    services
        .index
        .build(corpus_documents())
        .await
        .expect("Failed to build index");
    services
}
