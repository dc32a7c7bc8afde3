//! Google Gemini completion provider.
//!
//! Talks to the Generative Language REST API (`generateContent`). The same
//! endpoint serves the Gemma models the assistant runs on by default.
//!
//! # Authentication
//!
//! Uses an API key passed as the `key` query parameter. The binaries take it
//! from [`Settings`](crate::config::Settings).

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::llms::base_llm::{next_call_sequence, BaseLLM, GenerationConfig, LLMError};
use crate::utilities::string_utils::truncate_for_log;

/// Default REST endpoint root.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Google Gemini completion implementation.
///
/// # Example
///
/// ```ignore
/// let llm = GeminiCompletion::new("gemma-3-27b-it", Some(api_key));
/// let text = llm.call("Who won the 2024 Stanley Cup?", &GenerationConfig::default())?;
/// ```
#[derive(Clone)]
pub struct GeminiCompletion {
    /// Model name (e.g. "gemma-3-27b-it").
    pub model: String,
    api_key: Option<String>,
    /// Endpoint root, without the `/models/...` suffix.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl fmt::Debug for GeminiCompletion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiCompletion")
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiCompletion {
    /// Create a provider for `model`.
    pub fn new(model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Get the API endpoint URL.
    fn api_endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build generation config for the Gemini API.
    pub fn generation_config(config: &GenerationConfig) -> Value {
        let mut out = Map::new();
        if let Some(temp) = config.temperature {
            out.insert("temperature".to_string(), json!(temp));
        }
        if let Some(max_tokens) = config.max_output_tokens {
            out.insert("maxOutputTokens".to_string(), json!(max_tokens));
        }
        if let Some(top_p) = config.top_p {
            out.insert("topP".to_string(), json!(top_p));
        }
        if let Some(top_k) = config.top_k {
            out.insert("topK".to_string(), json!(top_k));
        }
        Value::Object(out)
    }

    /// Build the complete request body.
    fn build_request_body(prompt: &str, config: &GenerationConfig) -> Value {
        let mut body = json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }],
            }],
        });
        if !config.is_default() {
            body["generationConfig"] = Self::generation_config(config);
        }
        body
    }

    /// Parse a Gemini API response into its text.
    fn parse_response(response: &Value) -> Result<String, LLMError> {
        if let Some(error) = response.get("error") {
            let msg = error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown Gemini API error");
            return Err(LLMError::InvalidResponse(msg.to_string()));
        }

        let candidate = response
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .ok_or_else(|| {
                let reason = response
                    .pointer("/promptFeedback/blockReason")
                    .and_then(Value::as_str)
                    .unwrap_or("no candidates");
                LLMError::InvalidResponse(format!("Gemini returned no answer ({})", reason))
            })?;

        let parts = candidate
            .pointer("/content/parts")
            .and_then(Value::as_array)
            .ok_or_else(|| LLMError::InvalidResponse("No content.parts in Gemini response".into()))?;

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect();
        Ok(text)
    }

    /// Log token usage reported by the API.
    fn log_token_usage(response: &Value) {
        if let Some(usage) = response.get("usageMetadata") {
            let count = |key: &str| usage.get(key).and_then(Value::as_i64).unwrap_or(0);
            log::debug!(
                "Gemini usage: prompt_tokens={}, completion_tokens={}",
                count("promptTokenCount"),
                count("candidatesTokenCount"),
            );
        }
    }
}

#[async_trait]
impl BaseLLM for GeminiCompletion {
    fn model(&self) -> &str {
        &self.model
    }

    fn provider(&self) -> &str {
        "gemini"
    }

    fn call(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LLMError> {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(self.acall(prompt, config))
    }

    async fn acall(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LLMError> {
        let seq = next_call_sequence();
        log::debug!(
            "GeminiCompletion call #{}: model={}, prompt_chars={}",
            seq,
            self.model,
            prompt.chars().count(),
        );

        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LLMError::MissingApiKey("Gemini".into()))?;

        let client = reqwest::Client::builder().timeout(self.timeout).build()?;
        let response = client
            .post(self.api_endpoint())
            .query(&[("key", api_key)])
            .json(&Self::build_request_body(prompt, config))
            .send()
            .await?;

        let status = response.status();
        let response_text = response.text().await?;
        if !status.is_success() {
            return Err(LLMError::Api {
                provider: "Gemini".into(),
                status: status.as_u16(),
                message: truncate_for_log(&response_text, 500),
            });
        }

        let response_json: Value = serde_json::from_str(&response_text).map_err(|e| {
            LLMError::InvalidResponse(format!(
                "{} - Body: {}",
                e,
                truncate_for_log(&response_text, 500)
            ))
        })?;
        Self::log_token_usage(&response_json);

        let text = Self::parse_response(&response_json)?;
        log::debug!("Gemini call #{} returned: {}", seq, truncate_for_log(&text, 200));
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_config_keys() {
        let config = GeminiCompletion::generation_config(&GenerationConfig::summary());
        assert_eq!(config["maxOutputTokens"], json!(350));
        assert_eq!(config["temperature"], json!(0.7));
        assert_eq!(config["topP"], json!(0.9));
        assert_eq!(config["topK"], json!(40));
    }

    #[test]
    fn test_request_body_omits_default_config() {
        let body = GeminiCompletion::build_request_body("hi", &GenerationConfig::decision());
        assert_eq!(body["contents"][0]["parts"][0]["text"], json!("hi"));
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn test_endpoint() {
        let llm = GeminiCompletion::new("gemma-3-27b-it", Some("k".into()))
            .with_base_url("http://localhost:9999/v1beta/");
        assert_eq!(
            llm.api_endpoint(),
            "http://localhost:9999/v1beta/models/gemma-3-27b-it:generateContent"
        );
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let response = json!({
            "candidates": [{"content": {"parts": [{"text": "{\"tool\":"}, {"text": " \"none\"}"}]}}]
        });
        assert_eq!(
            GeminiCompletion::parse_response(&response).unwrap(),
            "{\"tool\": \"none\"}"
        );
    }

    #[test]
    fn test_parse_response_blocked_prompt() {
        let response = json!({"promptFeedback": {"blockReason": "SAFETY"}});
        let err = GeminiCompletion::parse_response(&response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_missing_key_fails_without_network() {
        let llm = GeminiCompletion::new("gemma-3-27b-it", None);
        let err = llm.call("hi", &GenerationConfig::default()).unwrap_err();
        assert!(matches!(err, LLMError::MissingApiKey(_)));
    }

    #[test]
    fn test_debug_hides_key() {
        let llm = GeminiCompletion::new("m", Some("secret".into()));
        assert!(!format!("{:?}", llm).contains("secret"));
    }
}
