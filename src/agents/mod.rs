//! Orchestration agents.
//!
//! This module provides the oracle output parser, the multi-step executor
//! that turns a question into tool results, and the summarizer that turns
//! results into prose.

pub mod executor;
pub mod parser;
pub mod summarizer;

// Re-exports for convenience
pub use executor::{AgentError, AgentExecutor, AgentStep, ExecutionMode, LoopOutcome, LoopState};
pub use parser::{extract_json, parse_decision, AgentDecision, DecisionParseError, StopReason};
pub use summarizer::Summarizer;
