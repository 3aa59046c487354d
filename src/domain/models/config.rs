use serde::{Deserialize, Serialize};

/// Main configuration structure for ragguard
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Vector index location
    #[serde(default)]
    pub index: IndexConfig,

    /// Passage retrieval and condensing
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Answer graph limits
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Generative text service
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Embedding service
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Call-site retry policy for external services
    #[serde(default)]
    pub retry: RetryConfig,

    /// Durable storage deadlines
    #[serde(default)]
    pub storage: StorageConfig,

    /// Session checkpoint database
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Vector index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IndexConfig {
    /// Directory holding the persisted index
    #[serde(default = "default_index_path")]
    pub path: String,

    /// Maximum characters per indexed passage
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive passages of one file
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// File extensions picked up when indexing a folder
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

fn default_index_path() -> String {
    ".ragguard/index".to_string()
}

const fn default_chunk_size() -> usize {
    1000
}

const fn default_chunk_overlap() -> usize {
    100
}

fn default_extensions() -> Vec<String> {
    ["txt", "md", "markdown", "rst", "csv", "json"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            extensions: default_extensions(),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetrievalConfig {
    /// Default number of passages for direct search and raw queries
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Maximum passages folded into one context block
    #[serde(default = "default_max_passages")]
    pub max_passages: usize,

    /// Character budget of the context block
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    /// Condense passages with the generative service
    #[serde(default = "default_true")]
    pub summarize: bool,
}

const fn default_top_k() -> usize {
    3
}

const fn default_max_passages() -> usize {
    3
}

const fn default_max_context_chars() -> usize {
    6000
}

const fn default_true() -> bool {
    true
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_passages: default_max_passages(),
            max_context_chars: default_max_context_chars(),
            summarize: default_true(),
        }
    }
}

/// Answer graph configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OrchestratorConfig {
    /// Failed validations tolerated before forcing termination
    #[serde(default = "default_max_validation_retries")]
    pub max_retries: u32,

    /// Passages fetched by the Retrieve node
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Messages kept per stored thread, oldest dropped first (0 keeps all)
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: usize,
}

const fn default_max_validation_retries() -> u32 {
    3
}

const fn default_max_history_messages() -> usize {
    50
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_validation_retries(),
            top_k: default_top_k(),
            max_history_messages: default_max_history_messages(),
        }
    }
}

/// Generative service backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    /// Google Gemini `generateContent`
    Gemini,
    /// Offline echo generator
    Mock,
}

/// Generative service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct GenerationConfig {
    #[serde(default = "default_generation_provider")]
    pub provider: GenerationProvider,

    #[serde(default = "default_generation_model")]
    pub model: String,

    /// API key; falls back to `GOOGLE_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_generation_base_url")]
    pub base_url: String,

    /// Deadline for one generation call
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    #[serde(default)]
    pub temperature: Option<f32>,
}

const fn default_generation_provider() -> GenerationProvider {
    GenerationProvider::Gemini
}

fn default_generation_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_generation_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

const fn default_generation_timeout_secs() -> u64 {
    60
}

const fn default_max_output_tokens() -> u32 {
    1024
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            api_key: None,
            base_url: default_generation_base_url(),
            timeout_secs: default_generation_timeout_secs(),
            max_output_tokens: default_max_output_tokens(),
            temperature: None,
        }
    }
}

/// Embedding service backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    /// OpenAI-compatible `/embeddings` endpoint
    OpenAi,
    /// Local feature-hashing embedder
    Hashing,
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_backend")]
    pub provider: EmbeddingBackend,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// API key; falls back to `OPENAI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// Vector dimension every embedding must have
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// Deadline for one embedding call
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_embedding_batch_size")]
    pub max_batch_size: usize,
}

const fn default_embedding_backend() -> EmbeddingBackend {
    EmbeddingBackend::Hashing
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

const fn default_embedding_dimension() -> usize {
    384
}

const fn default_embedding_timeout_secs() -> u64 {
    30
}

const fn default_embedding_batch_size() -> usize {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_backend(),
            model: default_embedding_model(),
            api_key: None,
            base_url: default_embedding_base_url(),
            dimension: default_embedding_dimension(),
            timeout_secs: default_embedding_timeout_secs(),
            max_batch_size: default_embedding_batch_size(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Retries after the first attempt (0 disables retrying)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff delay in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum backoff delay in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_initial_backoff_ms() -> u64 {
    500
}

const fn default_max_backoff_ms() -> u64 {
    8_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    /// Deadline for session store and index file operations
    #[serde(default = "default_storage_timeout_secs")]
    pub timeout_secs: u64,
}

const fn default_storage_timeout_secs() -> u64 {
    10
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_storage_timeout_secs(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".ragguard/sessions.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

impl Config {
    /// Copy with API keys masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if copy.generation.api_key.is_some() {
            copy.generation.api_key = Some("***".to_string());
        }
        if copy.embedding.api_key.is_some() {
            copy.embedding.api_key = Some("***".to_string());
        }
        copy
    }
}
