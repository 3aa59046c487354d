//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that adapters must implement:
//! - EmbeddingProvider: text to vector
//! - TextGenerator: prompt completion
//! - SessionRepository: conversation checkpoint storage
//! - DocumentLoader: source material for indexing

pub mod document_loader;
pub mod embedding;
pub mod generation;
pub mod session_repository;

pub use document_loader::DocumentLoader;
pub use embedding::{check_vector, EmbeddingInput, EmbeddingOutput, EmbeddingProvider};
pub use generation::TextGenerator;
pub use session_repository::SessionRepository;
