//! Chat surface.
//!
//! ```text
//! (question, history)
//!   → AgentExecutor (decide / execute tools)
//!   → Summarizer (explain the data)
//!   → ChatReply { result_type: text | data, payload }
//! ```

pub mod handler;
pub mod history;

pub use handler::{ChatHandler, ChatReply, ChatSession, ResultType};
pub use history::{ChatTurn, ConversationHistory, Role, DEFAULT_HISTORY_TURNS};
