//! Tool calling data structures.
//!
//! A [`ToolCalling`] is one structured invocation decoded from the oracle's
//! reply. The tool name resolves to the closed [`HockeyTool`] set so the
//! dispatcher can match on it exhaustively.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::catalog::{find_tool, ParamSpec, ToolSpec};

/// The tools the assistant can run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HockeyTool {
    PlayerOverview,
    Goalie,
    TopPlayers,
    TopGoalies,
    TeamOverview,
    TopTeams,
    TeamForm,
    PlayerForm,
    GoalieForm,
    /// A name the catalog does not know.
    Unknown(String),
}

impl HockeyTool {
    /// Every known tool.
    pub const KNOWN: [HockeyTool; 9] = [
        HockeyTool::PlayerOverview,
        HockeyTool::Goalie,
        HockeyTool::TopPlayers,
        HockeyTool::TopGoalies,
        HockeyTool::TeamOverview,
        HockeyTool::TopTeams,
        HockeyTool::TeamForm,
        HockeyTool::PlayerForm,
        HockeyTool::GoalieForm,
    ];

    /// Resolve a tool name as written by the oracle.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "get_player_overview" => Self::PlayerOverview,
            "get_goalie" => Self::Goalie,
            "top_players" => Self::TopPlayers,
            "top_goalies" => Self::TopGoalies,
            "get_team_overview" => Self::TeamOverview,
            "top_teams" => Self::TopTeams,
            "get_team_form" => Self::TeamForm,
            "get_player_form" => Self::PlayerForm,
            "get_goalie_form" => Self::GoalieForm,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::PlayerOverview => "get_player_overview",
            Self::Goalie => "get_goalie",
            Self::TopPlayers => "top_players",
            Self::TopGoalies => "top_goalies",
            Self::TeamOverview => "get_team_overview",
            Self::TopTeams => "top_teams",
            Self::TeamForm => "get_team_form",
            Self::PlayerForm => "get_player_form",
            Self::GoalieForm => "get_goalie_form",
            Self::Unknown(name) => name,
        }
    }

    /// Catalog entry for this tool; `None` for unknown names.
    pub fn spec(&self) -> Option<&'static ToolSpec> {
        match self {
            Self::Unknown(_) => None,
            known => find_tool(known.name()),
        }
    }
}

impl fmt::Display for HockeyTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for HockeyTool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for HockeyTool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(Self::from_name(&name))
    }
}

/// A tool call with its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCalling {
    pub tool: HockeyTool,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl ToolCalling {
    pub fn new(tool: HockeyTool, params: Map<String, Value>) -> Self {
        Self { tool, params }
    }

    /// Value supplied for `param`, trying its aliases too. Nulls count as absent.
    pub fn param(&self, param: &ParamSpec) -> Option<&Value> {
        std::iter::once(param.name)
            .chain(param.aliases.iter().copied())
            .filter_map(|key| self.params.get(key))
            .find(|v| !v.is_null())
    }
}

impl fmt::Display for ToolCalling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.tool, Value::Object(self.params.clone()))
    }
}
