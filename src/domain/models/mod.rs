pub mod config;
pub mod conversation;
pub mod document;

pub use config::{
    Config, DatabaseConfig, EmbeddingBackend, EmbeddingConfig, GenerationConfig, GenerationProvider,
    IndexConfig, LoggingConfig, OrchestratorConfig, RetrievalConfig, RetryConfig, StorageConfig,
};
pub use conversation::{
    AskError, AskResponse, ChatMessage, ConversationState, GraphNode, Role, ThreadSummary,
    ValidationVerdict, VERDICT_FAIL, VERDICT_PASS,
};
pub use document::{Document, QueryHit, QueryResult, DOCUMENT_ID_KEY, TEXT_KEY};
