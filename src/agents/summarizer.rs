//! Final explanation of retrieved data.

use std::sync::Arc;

use crate::llms::base_llm::{BaseLLM, GenerationConfig, LLMError};
use crate::utilities::prompts::summary_prompt;

/// Asks the oracle to explain tool results in prose.
#[derive(Debug, Clone)]
pub struct Summarizer {
    llm: Arc<dyn BaseLLM>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn BaseLLM>) -> Self {
        Self { llm }
    }

    /// Explain `rendered_results` as an answer to `question`.
    pub fn summarize(&self, question: &str, rendered_results: &str) -> Result<String, LLMError> {
        let prompt = summary_prompt(question, rendered_results);
        let text = self.llm.call(&prompt, &GenerationConfig::summary())?;
        Ok(text.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llms::scripted::ScriptedLLM;

    #[test]
    fn test_summarize_uses_fixed_settings() {
        let llm = Arc::new(ScriptedLLM::new(["  Kucherov led the league.  "]));
        let summarizer = Summarizer::new(llm.clone());
        let text = summarizer
            .summarize("Who led in points?", "Name  Points\nKucherov  144")
            .unwrap();
        assert_eq!(text, "Kucherov led the league.");
        assert_eq!(llm.configs(), vec![GenerationConfig::summary()]);
        assert!(llm.prompts()[0].contains("Kucherov  144"));
    }

    #[test]
    fn test_failure_propagates() {
        let llm = Arc::new(ScriptedLLM::new(Vec::<String>::new()).then_fail("down"));
        assert!(Summarizer::new(llm).summarize("q", "d").is_err());
    }
}
