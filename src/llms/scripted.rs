//! A scripted LLM for tests.
//!
//! Replays canned replies in order and records every prompt it was given.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::base_llm::{BaseLLM, GenerationConfig, LLMError};

#[derive(Debug, Default)]
pub struct ScriptedLLM {
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<(String, GenerationConfig)>>,
}

impl ScriptedLLM {
    pub fn new<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| Ok(r.into())).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a provider failure as the next reply.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.replies.lock().push_back(Err(message.into()));
        self
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().iter().map(|(p, _)| p.clone()).collect()
    }

    /// Generation settings received so far, in call order.
    pub fn configs(&self) -> Vec<GenerationConfig> {
        self.prompts.lock().iter().map(|(_, c)| *c).collect()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl BaseLLM for ScriptedLLM {
    fn model(&self) -> &str {
        "scripted"
    }

    fn call(&self, prompt: &str, config: &GenerationConfig) -> Result<String, LLMError> {
        self.prompts.lock().push((prompt.to_string(), *config));
        match self.replies.lock().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(LLMError::Api {
                provider: "scripted".into(),
                status: 503,
                message,
            }),
            None => Err(LLMError::InvalidResponse("script exhausted".into())),
        }
    }
}
