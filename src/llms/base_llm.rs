//! Base LLM trait for the assistant's oracle.
//!
//! The orchestration loop and the summarizer only need "prompt in, text
//! out". Providers implement [`BaseLLM`]; tests swap in a scripted double.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Generation settings
// ---------------------------------------------------------------------------

/// Sampling settings for one call. `None` leaves the provider default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
}

impl GenerationConfig {
    /// Settings for tool-selection calls: provider defaults.
    pub fn decision() -> Self {
        Self::default()
    }

    /// Settings for the final explanation.
    pub fn summary() -> Self {
        Self {
            temperature: Some(0.7),
            max_output_tokens: Some(350),
            top_p: Some(0.9),
            top_k: Some(40),
        }
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by an LLM provider.
#[derive(Debug, Error)]
pub enum LLMError {
    /// No credentials were configured.
    #[error("{0} API key not set. Set GOOGLE_API_KEY or NHL_ASSISTANT__GOOGLE_API_KEY.")]
    MissingApiKey(String),

    /// Transport failure or timeout.
    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error status.
    #[error("{provider} API error ({status}): {message}")]
    Api {
        provider: String,
        status: u16,
        message: String,
    },

    /// The provider answered with something other than text.
    #[error("Malformed LLM response: {0}")]
    InvalidResponse(String),

    /// The provider does not implement this call style.
    #[error("{0} is not supported by this LLM")]
    Unsupported(&'static str),

    /// Could not start the runtime for a blocking call.
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Call bookkeeping
// ---------------------------------------------------------------------------

/// Monotonically increasing call counter for debugging.
static CALL_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Get the next call sequence number.
pub fn next_call_sequence() -> usize {
    CALL_COUNTER.fetch_add(1, Ordering::Relaxed)
}

// ---------------------------------------------------------------------------
// BaseLLM trait
// ---------------------------------------------------------------------------

/// A text-completion model.
///
/// Implementations must be safe to share across request threads.
#[async_trait]
pub trait BaseLLM: Send + Sync + fmt::Debug {
    /// Get the model identifier/name.
    fn model(&self) -> &str;

    /// Get the provider name.
    fn provider(&self) -> &str {
        "unknown"
    }

    /// Complete `prompt` (blocking).
    fn call(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LLMError>;

    /// Complete `prompt` (asynchronous).
    ///
    /// Default implementation returns [`LLMError::Unsupported`].
    async fn acall(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LLMError> {
        let _ = (prompt, config);
        Err(LLMError::Unsupported("Async call"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_settings() {
        let c = GenerationConfig::summary();
        assert_eq!(c.max_output_tokens, Some(350));
        assert_eq!(c.temperature, Some(0.7));
        assert_eq!(c.top_p, Some(0.9));
        assert_eq!(c.top_k, Some(40));
        assert!(!c.is_default());
        assert!(GenerationConfig::decision().is_default());
    }

    #[test]
    fn test_call_sequence_increases() {
        let a = next_call_sequence();
        let b = next_call_sequence();
        assert!(b > a);
    }
}
