//! Document loading adapters.

pub mod chunker;
pub mod filesystem;

pub use chunker::Chunker;
pub use filesystem::{FilesystemLoader, CHUNK_INDEX_KEY, SOURCE_KEY};
