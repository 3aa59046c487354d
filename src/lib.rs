//! ragguard - self-validating retrieval-augmented question answering
//!
//! ragguard answers natural-language questions over a private document
//! collection. Each question runs through a small state machine:
//! relevant passages are retrieved from a vector index, an answer is
//! generated from them, and the answer is judged before it is returned.
//! Rejected answers trigger another retrieval cycle, up to a retry cap.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Adapters** (`adapters`): embedding and generation clients, SQLite
//!   checkpoints, the filesystem document loader
//! - **Service Layer** (`services`): vector index, retrieval, orchestrator,
//!   session store, indexing
//! - **Infrastructure Layer** (`infrastructure`): configuration, logging,
//!   deadlines, retry and service wiring
//! - **CLI Layer** (`cli`): command-line request layer
//!
//! # Example
//!
//! ```ignore
//! use ragguard::infrastructure::AppServices;
//! use ragguard::ConfigLoader;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::load()?;
//!     let services = AppServices::from_config(&config).await?;
//!     services.load_index().await?;
//!     let response = services.orchestrator.ask("How do I prevent SQL injection?", None).await;
//!     println!("{}", response.answer);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AskResponse, Config, ConversationState, Document, QueryHit, QueryResult, ValidationVerdict,
};
pub use domain::ports::{DocumentLoader, EmbeddingProvider, SessionRepository, TextGenerator};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{Orchestrator, RetrievalSearch, SessionStore, VectorIndex};
