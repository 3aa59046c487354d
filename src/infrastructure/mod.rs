//! Infrastructure layer module
//!
//! Cross-cutting plumbing the services run on:
//! - Configuration management (figment)
//! - Logging infrastructure (tracing)
//! - Deadlines and bounded retry for external calls
//! - Service wiring

pub mod config;
pub mod deadline;
pub mod logging;
pub mod retry;
pub mod setup;

pub use setup::AppServices;
