//! # nhl-assistant
//!
//! Conversational NHL statistics assistant. An LLM oracle decides which
//! statistics tools to call for a question, the tools read a local stats
//! store, and the results come back as markdown tables with a short
//! explanation.
//!
//! ```text
//! question ─► AgentExecutor ─► oracle decision ─► ToolDispatcher ─► StatsService ─► store
//!                 ▲                                      │
//!                 └──────────── ResultLog ◄──────────────┘
//! ```

pub mod agents;
pub mod chat;
pub mod config;
pub mod ingest;
pub mod llms;
pub mod server;
pub mod stats;
pub mod store;
pub mod tools;
pub mod utilities;

// Re-exports for convenience
pub use agents::{AgentExecutor, ExecutionMode, LoopOutcome};
pub use chat::{ChatHandler, ChatReply, ResultType};
pub use llms::BaseLLM;
pub use store::{StatsStore, StatsTable};
pub use tools::{HockeyTool, ToolCalling};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
