//! Prompt templates for the oracle.
//!
//! Two prompts exist: the decision prompt asking which tools to run next,
//! and the summary prompt asking for the final explanation.

use chrono::NaiveDate;

use crate::tools::catalog::render_catalog;
use crate::utilities::season::season_for_date;

/// Everything the decision prompt shows the oracle.
#[derive(Debug, Clone)]
pub struct DecisionContext<'a> {
    pub question: &'a str,
    /// Rendered conversation history, possibly empty.
    pub history: &'a str,
    /// Rendered results gathered so far for this question, possibly empty.
    pub results: &'a str,
    pub today: NaiveDate,
}

const DECISION_INSTRUCTIONS: &str = r#"Decide which tool to use and return ONLY a JSON object with no markdown formatting, no explanation.
Example format:
{"tool": "get_player_overview", "player_name": "Sidney Crosby", "season": "20232024"}
To call several tools at once, for example to compare players, return:
{"tools": [{"tool": "get_player_overview", "player_name": "Sidney Crosby"}, {"tool": "get_player_overview", "player_name": "Steven Stamkos"}]}
If the data already retrieved is enough to answer the question, return:
{"tool": "enough"}
You can also answer the question based on the conversation history. For example:
{"tool": "enough", "explanation": "Based on Sidney Crosby and Steven Stamkos data from earlier in the conversation, Sidney Crosby had the better season"}
If no tools can answer the question, give a brief explanation of why. For example:
{"tool": "none", "explanation": "I can only answer questions related to the NHL and not about football."}"#;

/// Build the "what next?" prompt.
pub fn decision_prompt(ctx: &DecisionContext<'_>) -> String {
    let mut prompt = String::from("You are a hockey data assistant.\n");
    prompt.push_str(&render_catalog());
    prompt.push_str(&format!(
        "\nToday's date is {}. The current season is {}; use it when the user does not name a season.\n",
        ctx.today.format("%Y-%m-%d"),
        season_for_date(ctx.today)
    ));
    prompt.push_str("\nConversation so far (may be empty):\n");
    prompt.push_str(ctx.history);
    prompt.push('\n');
    if !ctx.results.is_empty() {
        prompt.push_str("\nData already retrieved for this question:\n");
        prompt.push_str(ctx.results);
        prompt.push('\n');
    }
    prompt.push_str(&format!("\nUser question:\n\"{}\"\n\n", ctx.question));
    prompt.push_str(DECISION_INSTRUCTIONS);
    prompt.push('\n');
    prompt
}

/// Build the prompt asking for the final explanation of `data`.
pub fn summary_prompt(question: &str, data: &str) -> String {
    format!(
        "User question:\n{}\n\nData:\n{}\n\nExplain the result in clear hockey terms. Try to be as concise as possible.\n",
        question, data
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx<'a>(results: &'a str, history: &'a str) -> DecisionContext<'a> {
        DecisionContext {
            question: "Who had the most points?",
            history,
            results,
            today: NaiveDate::from_ymd_opt(2024, 11, 2).unwrap(),
        }
    }

    #[test]
    fn test_decision_prompt_contents() {
        let prompt = decision_prompt(&ctx("", "User: hi"));
        assert!(prompt.contains("top_players"));
        assert!(prompt.contains("Today's date is 2024-11-02"));
        assert!(prompt.contains("The current season is 20242025"));
        assert!(prompt.contains("User: hi"));
        assert!(prompt.contains("\"Who had the most points?\""));
        assert!(!prompt.contains("Data already retrieved"));
    }

    #[test]
    fn test_decision_prompt_includes_results() {
        let prompt = decision_prompt(&ctx("[1] top_players {}\nName  Points", ""));
        let data = prompt.find("Data already retrieved").unwrap();
        let question = prompt.find("User question").unwrap();
        assert!(data < question);
    }

    #[test]
    fn test_summary_prompt() {
        let prompt = summary_prompt("Q?", "Name  Points");
        assert!(prompt.starts_with("User question:\nQ?"));
        assert!(prompt.contains("Data:\nName  Points"));
    }
}
