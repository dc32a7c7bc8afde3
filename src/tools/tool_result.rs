//! Tool results and the per-question result log.

use serde::Serialize;
use serde_json::{Map, Value};

use super::tool_calling::{HockeyTool, ToolCalling};
use crate::store::Table;

/// What a tool produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ToolOutput {
    /// One or more tables.
    Data(Vec<Table>),
    /// A textual placeholder (unknown tool, rejected parameters).
    Text(String),
}

impl ToolOutput {
    pub fn table(table: Table) -> Self {
        Self::Data(vec![table])
    }

    pub fn is_data(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    /// Aligned plain-text rendering used in prompts.
    pub fn to_plain_text(&self) -> String {
        match self {
            Self::Data(tables) => tables
                .iter()
                .map(Table::to_plain_text)
                .collect::<Vec<_>>()
                .join("\n\n"),
            Self::Text(text) => text.clone(),
        }
    }

    /// Markdown rendering used for the chat reply.
    pub fn to_markdown(&self) -> String {
        match self {
            Self::Data(tables) => tables
                .iter()
                .map(Table::to_markdown)
                .collect::<Vec<_>>()
                .join("\n\n"),
            Self::Text(text) => text.clone(),
        }
    }
}

/// The outcome of one tool call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub tool: HockeyTool,
    pub params: Map<String, Value>,
    pub output: ToolOutput,
}

impl ToolResult {
    pub fn new(call: &ToolCalling, output: ToolOutput) -> Self {
        Self {
            tool: call.tool.clone(),
            params: call.params.clone(),
            output,
        }
    }

    fn heading(&self) -> String {
        format!("{} {}", self.tool, Value::Object(self.params.clone()))
    }
}

/// Ordered, append-only record of every tool result for one question.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResultLog {
    entries: Vec<ToolResult>,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: ToolResult) {
        self.entries.push(result);
    }

    pub fn entries(&self) -> &[ToolResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All results as plain text, one numbered block per call.
    ///
    /// This is what the oracle sees, both as context for the next decision
    /// and as the data to summarize.
    pub fn render_plain(&self) -> String {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, r)| format!("[{}] {}\n{}", i + 1, r.heading(), r.output.to_plain_text()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// All results as markdown, tables and text placeholders interleaved in
    /// call order.
    pub fn render_markdown(&self) -> String {
        self.entries
            .iter()
            .map(|r| r.output.to_markdown())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(tool: &str) -> ToolCalling {
        ToolCalling::new(
            HockeyTool::from_name(tool),
            json!({"season": "20232024"}).as_object().unwrap().clone(),
        )
    }

    #[test]
    fn test_render_keeps_call_order_and_interleaves_text() {
        let mut table = Table::new(["Team"]);
        table.push_row(vec![json!("Boston Bruins")]);

        let mut log = ResultLog::new();
        log.push(ToolResult::new(&call("top_teams"), ToolOutput::table(table)));
        log.push(ToolResult::new(
            &call("fetch_weather"),
            ToolOutput::Text("Unknown tool: fetch_weather".into()),
        ));

        let plain = log.render_plain();
        let first = plain.find("[1] top_teams").unwrap();
        let second = plain.find("[2] fetch_weather").unwrap();
        assert!(first < second);
        assert!(plain.contains("Boston Bruins"));

        let md = log.render_markdown();
        assert!(md.starts_with("| Team |"));
        assert!(md.ends_with("Unknown tool: fetch_weather"));
    }

    #[test]
    fn test_multi_table_output_renders_each_table() {
        let output = ToolOutput::Data(vec![Table::new(["A"]), Table::new(["B"])]);
        let text = output.to_plain_text();
        assert!(text.contains("Columns: A"));
        assert!(text.contains("Columns: B"));
        assert!(output.is_data());
    }
}
