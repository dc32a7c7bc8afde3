//! LLM layer.
//!
//! This module provides:
//!
//! - [`base_llm`] - The trait every oracle implements, its errors and sampling settings
//! - [`providers`] - Provider implementations (Google Gemini)
//! - `scripted` - A replaying double for tests

pub mod base_llm;
pub mod providers;
#[cfg(test)]
pub mod scripted;

// Re-exports for convenience
pub use base_llm::{BaseLLM, GenerationConfig, LLMError};
pub use providers::gemini::GeminiCompletion;
