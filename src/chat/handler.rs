//! Chat handler: question in, reply out.
//!
//! Runs the orchestration loop, has data summarized, and renders everything
//! as a [`ChatReply`]. Nothing fails past this point: every error becomes
//! `Error: ...` text.

use serde::{Deserialize, Serialize};

use super::history::ConversationHistory;
use crate::agents::executor::{AgentExecutor, LoopOutcome};
use crate::agents::parser::StopReason;
use crate::agents::summarizer::Summarizer;
use crate::tools::tool_result::ResultLog;

const EMPTY_QUESTION_REPLY: &str = "Please ask a question about NHL statistics.";
const OUT_OF_DOMAIN_REPLY: &str = "I can only answer questions about NHL statistics.";
const NO_ANSWER_REPLY: &str = "I could not find an answer to that.";

/// Kind of reply payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    /// Plain prose.
    Text,
    /// Markdown tables followed by an explanation.
    Data,
}

/// What the chat surface shows the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub result_type: ResultType,
    pub payload: String,
}

impl ChatReply {
    pub fn text(payload: impl Into<String>) -> Self {
        Self {
            result_type: ResultType::Text,
            payload: payload.into(),
        }
    }

    pub fn data(payload: impl Into<String>) -> Self {
        Self {
            result_type: ResultType::Data,
            payload: payload.into(),
        }
    }

    fn error(err: impl std::fmt::Display) -> Self {
        Self::text(format!("Error: {}", err))
    }
}

/// Answers questions with an executor and a summarizer.
#[derive(Debug)]
pub struct ChatHandler {
    executor: AgentExecutor,
    summarizer: Summarizer,
}

impl ChatHandler {
    pub fn new(executor: AgentExecutor, summarizer: Summarizer) -> Self {
        Self {
            executor,
            summarizer,
        }
    }

    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }

    /// Answer one question.
    pub fn answer(&self, question: &str, history: &ConversationHistory) -> ChatReply {
        let question = question.trim();
        if question.is_empty() {
            return ChatReply::text(EMPTY_QUESTION_REPLY);
        }

        match self.executor.run(question, history) {
            Ok(LoopOutcome::DoneData(results)) => self.render_data(question, &results),
            Ok(LoopOutcome::DoneText {
                reason,
                text,
                results,
            }) => {
                if !text.is_empty() {
                    ChatReply::text(text)
                } else if !results.is_empty() {
                    self.render_data(question, &results)
                } else {
                    match reason {
                        StopReason::OutOfDomain => ChatReply::text(OUT_OF_DOMAIN_REPLY),
                        StopReason::AnsweredFromContext => ChatReply::text(NO_ANSWER_REPLY),
                    }
                }
            }
            Err(e) => {
                log::warn!("Question failed: {}", e);
                ChatReply::error(e)
            }
        }
    }

    /// Tables first, then the summarizer's explanation.
    fn render_data(&self, question: &str, results: &ResultLog) -> ChatReply {
        match self.summarizer.summarize(question, &results.render_plain()) {
            Ok(explanation) => ChatReply::data(format!(
                "{}\n\n{}",
                results.render_markdown(),
                explanation
            )),
            Err(e) => {
                log::warn!("Summary failed: {}", e);
                ChatReply::error(e)
            }
        }
    }
}

/// A chat that remembers its own turns.
#[derive(Debug)]
pub struct ChatSession<'a> {
    handler: &'a ChatHandler,
    history: ConversationHistory,
}

impl<'a> ChatSession<'a> {
    pub fn new(handler: &'a ChatHandler, max_turns: usize) -> Self {
        Self {
            handler,
            history: ConversationHistory::new(max_turns),
        }
    }

    /// Answer and record the exchange.
    pub fn ask(&mut self, question: &str) -> ChatReply {
        let reply = self.handler.answer(question, &self.history);
        self.history.record_exchange(question.trim(), reply.payload.clone());
        reply
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }
}
