//! The tool-orchestration loop.
//!
//! One [`AgentExecutor::run`] answers one question:
//!
//! ```text
//! Deciding ──► Executing ──► Deciding ... ──► DoneData
//!    │                                   └──► (iteration limit) DoneData
//!    ├──► DoneText   (oracle says "enough" / "none")
//!    └──► Failed     (unparseable decision, oracle or store failure)
//! ```
//!
//! Every call of a batch runs in order and appends exactly one entry to the
//! [`ResultLog`]. A failure anywhere aborts the run and discards the log.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::parser::{parse_decision, AgentDecision, DecisionParseError, StopReason};
use crate::chat::history::ConversationHistory;
use crate::llms::base_llm::{BaseLLM, GenerationConfig, LLMError};
use crate::store::StoreError;
use crate::tools::dispatcher::ToolDispatcher;
use crate::tools::tool_calling::ToolCalling;
use crate::tools::tool_result::{ResultLog, ToolResult};
use crate::utilities::prompts::{decision_prompt, DecisionContext};
use crate::utilities::string_utils::truncate_for_log;

/// Default number of decide/execute rounds in multi-step mode.
pub const DEFAULT_MAX_ITERATIONS: usize = 3;

// ---------------------------------------------------------------------------
// Modes, outcomes, errors
// ---------------------------------------------------------------------------

/// How many decide/execute rounds a run may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Execute one decision, then finish with its data.
    SingleShot,
    /// Keep deciding until the oracle stops or `max_iterations` decisions
    /// have executed.
    MultiStep { max_iterations: usize },
}

impl Default for ExecutionMode {
    fn default() -> Self {
        Self::MultiStep {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Result of a successful run.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopOutcome {
    /// Data to be summarized.
    DoneData(ResultLog),
    /// The oracle ended the run with text. Data fetched in earlier
    /// iterations is kept in `results`.
    DoneText {
        reason: StopReason,
        text: String,
        results: ResultLog,
    },
}

/// Why a run failed.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("could not understand the model's decision: {0}")]
    DecisionParse(#[from] DecisionParseError),

    #[error("{0}")]
    Oracle(#[from] LLMError),

    #[error("{0}")]
    Store(#[from] StoreError),
}

/// Loop states, reported to the step callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Deciding,
    Executing,
    DoneData,
    DoneText,
    Failed,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Deciding => "deciding",
            Self::Executing => "executing",
            Self::DoneData => "done (data)",
            Self::DoneText => "done (text)",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Progress notification passed to the step callback.
#[derive(Debug)]
pub enum AgentStep<'a> {
    /// Entered a state.
    State { iteration: usize, state: LoopState },
    /// A call is about to run.
    Calling { iteration: usize, call: &'a ToolCalling },
    /// A call finished.
    Executed { iteration: usize, result: &'a ToolResult },
}

type StepCallback = Box<dyn Fn(&AgentStep<'_>) + Send + Sync>;

// ---------------------------------------------------------------------------
// AgentExecutor
// ---------------------------------------------------------------------------

/// Drives the oracle and the tools for one question at a time.
///
/// The executor holds no per-question state; concurrent runs on one
/// executor are independent.
pub struct AgentExecutor {
    llm: Arc<dyn BaseLLM>,
    dispatcher: ToolDispatcher,
    mode: ExecutionMode,
    step_callback: Option<StepCallback>,
}

impl fmt::Debug for AgentExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentExecutor")
            .field("llm", &self.llm)
            .field("mode", &self.mode)
            .field("has_step_callback", &self.step_callback.is_some())
            .finish()
    }
}

impl AgentExecutor {
    pub fn new(llm: Arc<dyn BaseLLM>, dispatcher: ToolDispatcher) -> Self {
        Self {
            llm,
            dispatcher,
            mode: ExecutionMode::default(),
            step_callback: None,
        }
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Observe loop progress (verbose CLI output).
    pub fn with_step_callback(
        mut self,
        callback: impl Fn(&AgentStep<'_>) + Send + Sync + 'static,
    ) -> Self {
        self.step_callback = Some(Box::new(callback));
        self
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn llm(&self) -> &Arc<dyn BaseLLM> {
        &self.llm
    }

    /// Answer `question` given the conversation so far.
    pub fn run(
        &self,
        question: &str,
        history: &ConversationHistory,
    ) -> Result<LoopOutcome, AgentError> {
        let history_text = history.render();
        let mut results = ResultLog::new();
        let mut iteration = 0usize;

        loop {
            iteration += 1;
            self.enter(iteration, LoopState::Deciding);

            let decision = match self.decide(question, &history_text, &results) {
                Ok(decision) => decision,
                Err(e) => {
                    self.enter(iteration, LoopState::Failed);
                    log::warn!("Run failed while deciding (iteration {}): {}", iteration, e);
                    return Err(e);
                }
            };

            let calls = match decision {
                AgentDecision::Decline(text) => {
                    self.enter(iteration, LoopState::DoneText);
                    return Ok(LoopOutcome::DoneText {
                        reason: StopReason::OutOfDomain,
                        text,
                        results,
                    });
                }
                AgentDecision::Stop(text) => {
                    self.enter(iteration, LoopState::DoneText);
                    return Ok(LoopOutcome::DoneText {
                        reason: StopReason::AnsweredFromContext,
                        text,
                        results,
                    });
                }
                AgentDecision::Single(call) => vec![call],
                AgentDecision::Batch(calls) => calls,
            };

            self.enter(iteration, LoopState::Executing);
            for call in &calls {
                self.notify(&AgentStep::Calling { iteration, call });
                let output = match self.dispatcher.execute(call) {
                    Ok(output) => output,
                    Err(e) => {
                        self.enter(iteration, LoopState::Failed);
                        log::warn!("Run failed executing {}: {}", call, e);
                        return Err(e.into());
                    }
                };
                let result = ToolResult::new(call, output);
                self.notify(&AgentStep::Executed {
                    iteration,
                    result: &result,
                });
                results.push(result);
            }

            match self.mode {
                ExecutionMode::SingleShot => break,
                ExecutionMode::MultiStep { max_iterations } if iteration >= max_iterations => {
                    log::debug!(
                        "Iteration limit {} reached with {} results",
                        max_iterations,
                        results.len()
                    );
                    break;
                }
                ExecutionMode::MultiStep { .. } => {}
            }
        }

        self.enter(iteration, LoopState::DoneData);
        Ok(LoopOutcome::DoneData(results))
    }

    /// Ask the oracle what to do next and parse its reply.
    fn decide(
        &self,
        question: &str,
        history_text: &str,
        results: &ResultLog,
    ) -> Result<AgentDecision, AgentError> {
        let rendered = results.render_plain();
        let prompt = decision_prompt(&DecisionContext {
            question,
            history: history_text,
            results: &rendered,
            today: self.dispatcher.today(),
        });
        let raw = self.llm.call(&prompt, &GenerationConfig::decision())?;
        log::debug!("Raw decision: {}", truncate_for_log(&raw, 300));
        Ok(parse_decision(&raw)?)
    }

    fn enter(&self, iteration: usize, state: LoopState) {
        log::debug!("Orchestration iteration {}: {}", iteration, state);
        self.notify(&AgentStep::State { iteration, state });
    }

    fn notify(&self, step: &AgentStep<'_>) {
        if let Some(callback) = &self.step_callback {
            callback(step);
        }
    }
}
