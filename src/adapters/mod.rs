//! Adapters for external systems.

pub mod embeddings;
pub mod generation;
pub mod guarded;
pub mod loader;
pub mod memory;
pub mod sqlite;

pub use guarded::{GuardedEmbedder, GuardedGenerator};
pub use memory::InMemorySessionRepository;
