//! Application services: indexing, retrieval, the answer graph and sessions.

pub mod indexing_service;
pub mod orchestrator;
pub mod prompts;
pub mod retrieval_search;
pub mod session_store;
pub mod vector_index;

pub use indexing_service::{IndexReport, IndexingService};
pub use orchestrator::{route_after_validation, Orchestrator, OrchestratorSettings, Route};
pub use retrieval_search::{RetrievalSearch, RetrievalSettings};
pub use session_store::SessionStore;
pub use vector_index::{IndexStats, VectorIndex};
