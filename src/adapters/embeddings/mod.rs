//! Embedding provider adapters.

pub mod hashing;
pub mod openai;

pub use hashing::HashingEmbeddingProvider;
pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};
