//! Domain errors for the ragguard question-answering core.

use thiserror::Error;

/// Domain-level errors that can occur anywhere in the retrieval pipeline.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Missing or invalid configuration (credentials, settings). Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The embedding service failed or returned unusable vectors.
    #[error("Embedding error: {message}")]
    Embedding { message: String, transient: bool },

    /// The generative text service failed.
    #[error("Generation error: {message}")]
    Generation { message: String, transient: bool },

    /// Persisted index state is inconsistent.
    #[error("Corrupt index at {path}: {reason}")]
    CorruptIndex { path: String, reason: String },

    #[error("Index not ready: build or load an index before querying")]
    IndexNotReady,

    /// A blocking I/O boundary exceeded its deadline.
    #[error("{operation} timed out after {elapsed_ms}ms")]
    Timeout { operation: String, elapsed_ms: u64 },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Permanent embedding failure (bad response, dimension mismatch).
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding { message: message.into(), transient: false }
    }

    /// Embedding failure worth retrying (network, 429, 5xx).
    pub fn embedding_transient(message: impl Into<String>) -> Self {
        Self::Embedding { message: message.into(), transient: true }
    }

    /// Permanent generation failure.
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation { message: message.into(), transient: false }
    }

    /// Generation failure worth retrying.
    pub fn generation_transient(message: impl Into<String>) -> Self {
        Self::Generation { message: message.into(), transient: true }
    }

    /// Stable snake_case name of the error kind, used in degraded responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration_error",
            Self::NotFound(_) => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Embedding { .. } => "embedding_error",
            Self::Generation { .. } => "generation_error",
            Self::CorruptIndex { .. } => "corrupt_index",
            Self::IndexNotReady => "index_not_ready",
            Self::Timeout { .. } => "timeout",
            Self::Storage(_) => "storage_error",
            Self::SerializationError(_) => "serialization_error",
        }
    }

    /// Whether a bounded call-site retry may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Embedding { transient, .. } | Self::Generation { transient, .. } => *transient,
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        DomainError::Storage(err.to_string())
    }
}
