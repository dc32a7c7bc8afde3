//! Oracle output parsing.
//!
//! The oracle is asked for a bare JSON object but often wraps it in code
//! fences or prose, or gets cut off mid-object. [`extract_json`] recovers the
//! best candidate object text; [`parse_decision`] turns it into an
//! [`AgentDecision`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::tools::tool_calling::{HockeyTool, ToolCalling};
use crate::utilities::string_utils::truncate_for_log;

/// Code fence with an optional language tag.
static FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```[A-Za-z0-9_+-]*").unwrap());

/// Sentinel for "this question is outside what the tools can answer".
const SENTINEL_NONE: &str = "none";
/// Sentinels for "the context already answers the question".
const SENTINELS_ENOUGH: &[&str] = &["enough", "done"];

/// Keys that may hold a call's parameters as a nested object.
const NESTED_PARAM_KEYS: &[&str] = &["params", "parameters", "arguments"];

// ---------------------------------------------------------------------------
// Decision types
// ---------------------------------------------------------------------------

/// Why the loop stopped without new data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Conversation history or already-fetched data answers the question.
    AnsweredFromContext,
    /// No tool can answer the question.
    OutOfDomain,
}

/// What the oracle decided to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentDecision {
    /// Run one tool.
    Single(ToolCalling),
    /// Run several tools, in order.
    Batch(Vec<ToolCalling>),
    /// Stop: the answer is already in context. Holds the oracle's explanation.
    Stop(String),
    /// Stop: out of domain. Holds the oracle's explanation.
    Decline(String),
}

impl AgentDecision {
    /// Terminal reason, if this decision ends the loop.
    pub fn stop_reason(&self) -> Option<StopReason> {
        match self {
            Self::Stop(_) => Some(StopReason::AnsweredFromContext),
            Self::Decline(_) => Some(StopReason::OutOfDomain),
            Self::Single(_) | Self::Batch(_) => None,
        }
    }
}

/// Error raised when the oracle's reply is not a usable decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionParseError {
    #[error("reply is not valid JSON ({message}): {fragment}")]
    InvalidJson { message: String, fragment: String },

    #[error("reply is JSON but not an object: {0}")]
    NotAnObject(String),

    #[error("reply has no \"tool\" or \"tools\" key")]
    MissingTool,

    #[error("\"tools\" must be a non-empty array of calls")]
    EmptyBatch,

    #[error("entry {0} of \"tools\" is not a call object")]
    InvalidBatchEntry(usize),
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Recover the JSON object text from an oracle reply.
///
/// Strips code fences, then returns the first balanced `{...}` span. Braces
/// inside string literals do not count, and a backslash escapes the next
/// character. If the reply ends inside the object, the partial span from the
/// opening brace is returned; if there is no `{` at all, the stripped text.
pub fn extract_json(raw: &str) -> String {
    let stripped = FENCE.replace_all(raw, "");
    let text = stripped.trim();

    let Some(start) = text.find('{') else {
        return text.to_string();
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return text[start..start + offset + c.len_utf8()].to_string();
                }
            }
            _ => {}
        }
    }
    text[start..].to_string()
}

// ---------------------------------------------------------------------------
// Decision parsing
// ---------------------------------------------------------------------------

/// Parse an oracle reply into a decision.
///
/// A `tools` array takes precedence over a `tool` key. Control sentinels
/// inside a batch are ignored.
pub fn parse_decision(raw: &str) -> Result<AgentDecision, DecisionParseError> {
    let candidate = extract_json(raw);
    let value: Value = serde_json::from_str(&candidate).map_err(|e| DecisionParseError::InvalidJson {
        message: e.to_string(),
        fragment: truncate_for_log(&candidate, 200),
    })?;
    let Value::Object(object) = value else {
        return Err(DecisionParseError::NotAnObject(truncate_for_log(&candidate, 200)));
    };

    if let Some(tools) = object.get("tools") {
        return parse_batch(tools);
    }

    let name = tool_name(&object).ok_or(DecisionParseError::MissingTool)?;
    let explanation = object
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    if name.eq_ignore_ascii_case(SENTINEL_NONE) {
        return Ok(AgentDecision::Decline(explanation));
    }
    if SENTINELS_ENOUGH.iter().any(|s| name.eq_ignore_ascii_case(s)) {
        return Ok(AgentDecision::Stop(explanation));
    }
    Ok(AgentDecision::Single(to_calling(name, &object)))
}

fn parse_batch(tools: &Value) -> Result<AgentDecision, DecisionParseError> {
    let entries = tools.as_array().ok_or(DecisionParseError::EmptyBatch)?;
    let mut calls = Vec::with_capacity(entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let object = entry
            .as_object()
            .ok_or(DecisionParseError::InvalidBatchEntry(i))?;
        let name = tool_name(object).ok_or(DecisionParseError::InvalidBatchEntry(i))?;
        if is_sentinel(name) {
            log::debug!("Ignoring sentinel '{}' inside batch", name);
            continue;
        }
        calls.push(to_calling(name, object));
    }
    if calls.is_empty() {
        return Err(DecisionParseError::EmptyBatch);
    }
    Ok(AgentDecision::Batch(calls))
}

fn tool_name(object: &Map<String, Value>) -> Option<&str> {
    object
        .get("tool")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn is_sentinel(name: &str) -> bool {
    name.eq_ignore_ascii_case(SENTINEL_NONE)
        || SENTINELS_ENOUGH.iter().any(|s| name.eq_ignore_ascii_case(s))
}

/// Build a call from an object; parameters come from a nested object when
/// present, otherwise from every top-level key except `tool`.
fn to_calling(name: &str, object: &Map<String, Value>) -> ToolCalling {
    let nested = NESTED_PARAM_KEYS
        .iter()
        .find_map(|k| object.get(*k).and_then(Value::as_object));
    let params = match nested {
        Some(params) => params.clone(),
        None => object
            .iter()
            .filter(|(k, _)| k.as_str() != "tool")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    };
    ToolCalling::new(HockeyTool::from_name(name), params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_fenced_json_with_prose() {
        let raw = "Sure! Here you go:\n```json\n{\"tool\": \"top_players\", \"n\": 5}\n```\nLet me know.";
        assert_eq!(extract_json(raw), "{\"tool\": \"top_players\", \"n\": 5}");
    }

    #[test]
    fn test_extract_unfenced_with_trailing_prose() {
        let raw = "{\"tool\": \"none\", \"explanation\": \"x\"} and then {\"other\": 1}";
        assert_eq!(extract_json(raw), "{\"tool\": \"none\", \"explanation\": \"x\"}");
    }

    #[test]
    fn test_extract_nested_objects() {
        let raw = "{\"tools\": [{\"tool\": \"a\"}, {\"tool\": \"b\"}]} trailing";
        assert_eq!(extract_json(raw), "{\"tools\": [{\"tool\": \"a\"}, {\"tool\": \"b\"}]}");
    }

    #[test]
    fn test_extract_braces_inside_strings() {
        let raw = r#"{"tool":"none","explanation":"a { b"} extra }"#;
        assert_eq!(extract_json(raw), r#"{"tool":"none","explanation":"a { b"}"#);
    }

    #[test]
    fn test_extract_escaped_quote_in_string() {
        let raw = r#"{"tool":"none","explanation":"say \"}\" loudly"} tail"#;
        assert_eq!(extract_json(raw), r#"{"tool":"none","explanation":"say \"}\" loudly"}"#);
    }

    #[test]
    fn test_extract_truncated_returns_fragment() {
        let raw = "prefix {\"tool\": \"get_player_overview\", \"player_name\": \"Sid";
        assert_eq!(extract_json(raw), "{\"tool\": \"get_player_overview\", \"player_name\": \"Sid");
        assert!(matches!(
            parse_decision(raw),
            Err(DecisionParseError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_extract_without_brace_returns_stripped_text() {
        assert_eq!(extract_json("```\nno json here\n```"), "no json here");
    }

    #[test]
    fn test_parse_none_is_decline() {
        let decision = parse_decision(r#"{"tool":"none","explanation":"X"}"#).unwrap();
        assert_eq!(decision, AgentDecision::Decline("X".into()));
        assert_eq!(decision.stop_reason(), Some(StopReason::OutOfDomain));
    }

    #[test]
    fn test_parse_enough_and_done_are_stop() {
        for raw in [r#"{"tool":"enough"}"#, r#"{"tool":"DONE","explanation":"Y"}"#] {
            let decision = parse_decision(raw).unwrap();
            assert_eq!(decision.stop_reason(), Some(StopReason::AnsweredFromContext));
        }
    }

    #[test]
    fn test_parse_single_with_inline_params() {
        let decision =
            parse_decision(r#"{"tool":"get_player_overview","player_name":"Sidney Crosby","season":"20232024"}"#)
                .unwrap();
        let AgentDecision::Single(call) = decision else {
            panic!("expected single call");
        };
        assert_eq!(call.tool, HockeyTool::PlayerOverview);
        assert_eq!(call.params.get("player_name"), Some(&json!("Sidney Crosby")));
        assert!(call.params.get("tool").is_none());
    }

    #[test]
    fn test_parse_single_with_nested_params() {
        let decision = parse_decision(r#"{"tool":"top_teams","params":{"metric":"wins"}}"#).unwrap();
        let AgentDecision::Single(call) = decision else {
            panic!("expected single call");
        };
        assert_eq!(call.params.len(), 1);
        assert_eq!(call.params.get("metric"), Some(&json!("wins")));
    }

    #[test]
    fn test_batch_wins_over_single() {
        let raw = r#"{"tool":"top_teams","tools":[{"tool":"get_goalie","player_name":"A"},{"tool":"top_goalies"}]}"#;
        let AgentDecision::Batch(calls) = parse_decision(raw).unwrap() else {
            panic!("expected batch");
        };
        let names: Vec<&str> = calls.iter().map(|c| c.tool.name()).collect();
        assert_eq!(names, vec!["get_goalie", "top_goalies"]);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_decision("[1, 2]"), Err(DecisionParseError::NotAnObject("[1, 2]".into())));
        assert_eq!(parse_decision(r#"{"player":"x"}"#), Err(DecisionParseError::MissingTool));
        assert_eq!(parse_decision(r#"{"tools":[]}"#), Err(DecisionParseError::EmptyBatch));
        assert_eq!(
            parse_decision(r#"{"tools":[{"tool":"top_teams"}, 3]}"#),
            Err(DecisionParseError::InvalidBatchEntry(1))
        );
    }

    #[test]
    fn test_unknown_tool_parses_as_call() {
        let AgentDecision::Single(call) = parse_decision(r#"{"tool":"fetch_weather"}"#).unwrap() else {
            panic!("expected single call");
        };
        assert_eq!(call.tool, HockeyTool::Unknown("fetch_weather".into()));
    }
}
