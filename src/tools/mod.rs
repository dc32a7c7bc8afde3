//! Hockey tools.
//!
//! This module provides the tool catalog shown to the oracle, the decoded
//! tool call, the dispatcher that runs calls against the statistics layer,
//! and the result log that accumulates their output.

pub mod catalog;
pub mod dispatcher;
pub mod tool_calling;
pub mod tool_result;

// Re-exports for convenience
pub use catalog::{render_catalog, ParamKind, ParamSpec, ToolSpec, TOOL_CATALOG};
pub use dispatcher::ToolDispatcher;
pub use tool_calling::{HockeyTool, ToolCalling};
pub use tool_result::{ResultLog, ToolOutput, ToolResult};
