//! Text generation adapters.

pub mod gemini;
pub mod mock;

pub use gemini::{GeminiConfig, GeminiGenerator};
pub use mock::{MockGenerator, MockReply};
