//! Maps tool calls onto statistics queries.
//!
//! Parameters are checked against the catalog before any query runs. A call
//! the dispatcher cannot run (unknown tool, missing name, value outside the
//! allowed set) becomes a text result so the rest of a batch still executes.
//! Only store failures are returned as errors.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde_json::Value;

use super::catalog::{ParamKind, ToolSpec};
use super::tool_calling::{HockeyTool, ToolCalling};
use super::tool_result::ToolOutput;
use crate::stats::StatsService;
use crate::store::StoreError;
use crate::utilities::season::{is_valid_season, season_for_date};

/// Upper bound on requested row counts.
const MAX_ROWS: usize = 50;

/// Executes [`ToolCalling`]s against a [`StatsService`].
#[derive(Debug, Clone)]
pub struct ToolDispatcher {
    stats: StatsService,
    /// Fixed "today" for tests; `None` reads the local clock.
    today: Option<NaiveDate>,
}

impl ToolDispatcher {
    pub fn new(stats: StatsService) -> Self {
        Self { stats, today: None }
    }

    /// Pin the date used for default seasons and form cut-offs.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Run one call.
    pub fn execute(&self, call: &ToolCalling) -> Result<ToolOutput, StoreError> {
        let Some(spec) = call.tool.spec() else {
            log::warn!("Oracle asked for unknown tool '{}'", call.tool);
            return Ok(ToolOutput::Text(format!(
                "Unknown tool: {}. No data was retrieved for this request.",
                call.tool
            )));
        };

        let args = match Args::resolve(spec, call, self.today()) {
            Ok(args) => args,
            Err(message) => {
                log::warn!("Rejected call {}: {}", call, message);
                return Ok(ToolOutput::Text(message));
            }
        };
        log::debug!("Executing {} with {:?}", spec.name, args.values);

        let season = args.text("season");
        let output = match &call.tool {
            HockeyTool::PlayerOverview => {
                ToolOutput::table(self.stats.player_overview(args.text("player_name"), season)?)
            }
            HockeyTool::Goalie => ToolOutput::table(self.stats.goalie(args.text("player_name"), season)?),
            HockeyTool::TopPlayers => ToolOutput::table(self.stats.top_players(
                season,
                args.optional("position"),
                args.text("metric"),
                args.count("n"),
            )?),
            HockeyTool::TopGoalies => ToolOutput::table(self.stats.top_goalies(
                season,
                args.text("metric"),
                args.count("n"),
            )?),
            HockeyTool::TeamOverview => {
                ToolOutput::table(self.stats.team_overview(args.text("team_name"), season)?)
            }
            HockeyTool::TopTeams => ToolOutput::table(self.stats.top_teams(
                season,
                args.text("metric"),
                args.count("n"),
            )?),
            HockeyTool::TeamForm => ToolOutput::Data(
                self.stats
                    .team_form(args.text("team_name"), season, args.count("n"), self.today())?
                    .into_tables(),
            ),
            HockeyTool::PlayerForm => ToolOutput::table(self.stats.player_form(
                args.text("player_name"),
                season,
                args.count("n"),
                self.today(),
            )?),
            HockeyTool::GoalieForm => ToolOutput::table(self.stats.goalie_form(
                args.text("player_name"),
                season,
                args.count("n"),
                self.today(),
            )?),
            HockeyTool::Unknown(name) => ToolOutput::Text(format!("Unknown tool: {}", name)),
        };
        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Argument resolution
// ---------------------------------------------------------------------------

/// Validated, normalized arguments for one call.
#[derive(Debug)]
struct Args {
    values: HashMap<&'static str, String>,
}

impl Args {
    /// Check every catalog parameter and fill defaults.
    ///
    /// Returns the user-facing placeholder text on rejection.
    fn resolve(spec: &ToolSpec, call: &ToolCalling, today: NaiveDate) -> Result<Self, String> {
        let mut values = HashMap::new();
        for param in spec.parameters {
            let supplied = call.param(param).map(value_text).filter(|s| !s.is_empty());
            let value = match (supplied, param.kind) {
                (None, ParamKind::Season) => Some(season_for_date(today)),
                (None, _) if param.required => {
                    return Err(format!(
                        "Missing required parameter '{}' for tool '{}'.",
                        param.name, spec.name
                    ));
                }
                (None, _) => param.default.map(str::to_string),
                (Some(raw), ParamKind::Season) => {
                    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
                    if !is_valid_season(&digits) {
                        return Err(format!(
                            "Invalid season '{}' for tool '{}'. Use the YYYYYYYY format, e.g. 20232024.",
                            raw, spec.name
                        ));
                    }
                    Some(digits)
                }
                (Some(raw), ParamKind::Choice) => match param.canonical(&raw) {
                    Some(canonical) => Some(canonical.to_string()),
                    None => {
                        return Err(format!(
                            "Invalid value '{}' for parameter '{}' of tool '{}'. Allowed values: {}.",
                            raw,
                            param.name,
                            spec.name,
                            param.allowed_values.unwrap_or_default().join(", ")
                        ));
                    }
                },
                (Some(raw), ParamKind::Count) => match raw.parse::<f64>() {
                    Ok(n) if n >= 1.0 => Some((n.floor() as usize).min(MAX_ROWS).to_string()),
                    _ => {
                        return Err(format!(
                            "Invalid value '{}' for parameter '{}' of tool '{}'. Expected a positive number.",
                            raw, param.name, spec.name
                        ));
                    }
                },
                (Some(raw), ParamKind::Text) => Some(raw),
            };
            if let Some(value) = value {
                values.insert(param.name, value);
            }
        }
        Ok(Self { values })
    }

    fn text(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or_default()
    }

    fn optional(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn count(&self, name: &str) -> usize {
        self.values
            .get(name)
            .and_then(|v| v.parse().ok())
            .unwrap_or(1)
    }
}

/// Text form of a JSON parameter value.
fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}
