//! Logging infrastructure
//!
//! Structured logging using tracing and tracing-subscriber, with optional
//! JSON log files rotated by tracing-appender.

pub mod logger;

pub use logger::LoggerImpl;
