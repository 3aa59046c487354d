//! Service wiring.
//!
//! Builds the long-lived service graph from a [`Config`]: one embedding
//! provider and one text generator (both behind timeout + retry guards),
//! one vector index, the retrieval search, the session store and the
//! orchestrator.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::adapters::embeddings::{HashingEmbeddingProvider, OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
use crate::adapters::generation::{GeminiConfig, GeminiGenerator, MockGenerator};
use crate::adapters::loader::{Chunker, FilesystemLoader};
use crate::adapters::sqlite::{database_url, initialize_database, PoolConfig, SqliteSessionRepository};
use crate::adapters::{GuardedEmbedder, GuardedGenerator};
use crate::domain::errors::DomainResult;
use crate::domain::models::{Config, EmbeddingBackend, GenerationProvider};
use crate::domain::ports::{EmbeddingProvider, SessionRepository, TextGenerator};
use crate::services::{
    IndexingService, Orchestrator, OrchestratorSettings, RetrievalSearch, RetrievalSettings, SessionStore,
    VectorIndex,
};

use super::retry::RetryPolicy;

/// The wired service graph shared by every request.
pub struct AppServices {
    pub config: Config,
    pub index: Arc<VectorIndex>,
    pub retrieval: Arc<RetrievalSearch>,
    pub sessions: Arc<SessionStore>,
    pub orchestrator: Arc<Orchestrator>,
    pub indexing: IndexingService,
}

impl AppServices {
    /// Wire the configured providers with the SQLite session store.
    pub async fn from_config(config: &Config) -> DomainResult<Self> {
        let embedder = build_embedder(config)?;
        let generator = build_generator(config)?;

        let repository = open_session_repository(config).await?;

        Self::with_components(config, embedder, generator, repository)
    }

    /// Wire caller-supplied providers and repository.
    ///
    /// The embedder and generator are wrapped in the configured deadline and
    /// retry guards.
    pub fn with_components(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn TextGenerator>,
        repository: Arc<dyn SessionRepository>,
    ) -> DomainResult<Self> {
        let retry = RetryPolicy::from(&config.retry);
        let storage_timeout = Duration::from_secs(config.storage.timeout_secs);

        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(GuardedEmbedder::new(
            embedder,
            Duration::from_secs(config.embedding.timeout_secs),
            retry.clone(),
        ));
        let generator: Arc<dyn TextGenerator> = Arc::new(GuardedGenerator::new(
            generator,
            Duration::from_secs(config.generation.timeout_secs),
            retry,
        ));

        let index = Arc::new(VectorIndex::new(embedder, storage_timeout));
        let retrieval = Arc::new(RetrievalSearch::new(
            index.clone(),
            generator.clone(),
            RetrievalSettings::from(&config.retrieval),
        ));
        let sessions = Arc::new(SessionStore::new(repository, storage_timeout));
        let orchestrator = Arc::new(Orchestrator::new(
            retrieval.clone(),
            generator,
            sessions.clone(),
            OrchestratorSettings::from(&config.orchestrator),
        ));

        let chunker = Chunker::new(config.index.chunk_size, config.index.chunk_overlap)?;
        let loader = FilesystemLoader::new(chunker, config.index.extensions.clone());
        let indexing = IndexingService::new(Arc::new(loader), index.clone(), PathBuf::from(&config.index.path));

        Ok(Self {
            config: config.clone(),
            index,
            retrieval,
            sessions,
            orchestrator,
            indexing,
        })
    }

    /// Load the persisted index, if any. Returns whether one was found.
    pub async fn load_index(&self) -> DomainResult<bool> {
        let loaded = self.indexing.load_existing().await?;
        if loaded {
            info!(
                path = %self.indexing.index_path().display(),
                passages = self.index.len().await,
                "index loaded"
            );
        }
        Ok(loaded)
    }
}

/// Open the SQLite checkpoint database, applying pending migrations.
pub async fn open_session_repository(config: &Config) -> DomainResult<Arc<dyn SessionRepository>> {
    let pool = initialize_database(
        &database_url(&config.database.path),
        Some(PoolConfig::from(&config.database)),
    )
    .await?;
    debug!(path = %config.database.path, "session database ready");
    Ok(Arc::new(SqliteSessionRepository::new(pool)))
}

/// Session store over the configured database, without the model providers.
pub async fn open_session_store(config: &Config) -> DomainResult<SessionStore> {
    let repository = open_session_repository(config).await?;
    Ok(SessionStore::new(repository, Duration::from_secs(config.storage.timeout_secs)))
}

/// Build the configured embedding provider.
pub fn build_embedder(config: &Config) -> DomainResult<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.embedding.provider {
        EmbeddingBackend::OpenAi => Arc::new(OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::from(
            &config.embedding,
        ))?),
        EmbeddingBackend::Hashing => Arc::new(HashingEmbeddingProvider::new(config.embedding.dimension)?),
    };
    debug!(provider = embedder.name(), dimension = embedder.dimension(), "embedding provider ready");
    Ok(embedder)
}

/// Build the configured text generator.
pub fn build_generator(config: &Config) -> DomainResult<Arc<dyn TextGenerator>> {
    let generator: Arc<dyn TextGenerator> = match config.generation.provider {
        GenerationProvider::Gemini => Arc::new(GeminiGenerator::new(GeminiConfig::from(&config.generation))?),
        GenerationProvider::Mock => Arc::new(MockGenerator::offline()),
    };
    debug!(provider = generator.name(), "text generator ready");
    Ok(generator)
}
