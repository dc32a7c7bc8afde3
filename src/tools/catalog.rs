//! Static catalog of the hockey tools.
//!
//! The catalog is the single description of what the oracle may call. It is
//! rendered verbatim into every decision prompt and is the reference the
//! dispatcher validates parameters against.

use std::fmt::Write as _;

/// Kind of value a parameter carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Free text such as a player or team name.
    Text,
    /// An 8-digit season id.
    Season,
    /// A positive row count.
    Count,
    /// One of a fixed set of values.
    Choice,
}

/// Schema of one tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    /// Values accepted for [`ParamKind::Choice`] parameters.
    pub allowed_values: Option<&'static [&'static str]>,
    pub required: bool,
    /// Value used when the oracle omits the parameter.
    pub default: Option<&'static str>,
    /// Older key names still accepted for this parameter.
    pub aliases: &'static [&'static str],
}

impl ParamSpec {
    /// Canonical spelling of an accepted choice value.
    pub fn canonical(&self, value: &str) -> Option<&'static str> {
        self.allowed_values?
            .iter()
            .copied()
            .find(|v| v.eq_ignore_ascii_case(value))
    }
}

/// Schema of one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: &'static [ParamSpec],
}

impl ToolSpec {
    pub fn param(&self, name: &str) -> Option<&'static ParamSpec> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

// ---------------------------------------------------------------------------
// Parameter definitions
// ---------------------------------------------------------------------------

const SEASON: ParamSpec = ParamSpec {
    name: "season",
    kind: ParamKind::Season,
    description: "Which season. The format is YYYYYYYY, 20232024 for example. Defaults to the current season",
    allowed_values: None,
    required: false,
    default: None,
    aliases: &[],
};

const PLAYER_NAME: ParamSpec = ParamSpec {
    name: "player_name",
    kind: ParamKind::Text,
    description: "The full (first name and last name) name of the player",
    allowed_values: None,
    required: true,
    default: None,
    aliases: &["name"],
};

const TEAM_NAME: ParamSpec = ParamSpec {
    name: "team_name",
    kind: ParamKind::Text,
    description: "The full name of the team, e.g. \"Toronto Maple Leafs\"",
    allowed_values: None,
    required: true,
    default: None,
    aliases: &["teamName"],
};

const fn count(default: &'static str, description: &'static str) -> ParamSpec {
    ParamSpec {
        name: "n",
        kind: ParamKind::Count,
        description,
        allowed_values: None,
        required: false,
        default: Some(default),
        aliases: &[],
    }
}

pub const PLAYER_METRICS: &[&str] = &["points", "points_per_game", "ev_points", "goals", "assists"];
pub const GOALIE_METRICS: &[&str] = &["save_pct", "goals_against_average", "wins", "shutouts"];
pub const TEAM_METRICS: &[&str] = &["points", "wins", "goals_for", "power_play_pct", "penalty_kill_pct"];
pub const POSITIONS: &[&str] = &["F", "D", "C", "L", "R"];

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Every tool the oracle may call, in prompt order.
pub static TOOL_CATALOG: &[ToolSpec] = &[
    ToolSpec {
        name: "get_player_overview",
        description: "Use when the user asks for a season overview of a player, e.g. \"How good is Jesper Fast this season\", or wants to compare players (call it once per player). Goalies are found too",
        parameters: &[PLAYER_NAME, SEASON],
    },
    ToolSpec {
        name: "get_goalie",
        description: "Use when the user asks about a specific goalie's season",
        parameters: &[PLAYER_NAME, SEASON],
    },
    ToolSpec {
        name: "top_players",
        description: "Use when the user asks for the best skaters, rankings or leaders",
        parameters: &[
            SEASON,
            ParamSpec {
                name: "position",
                kind: ParamKind::Choice,
                description: "\"F\" (forwards), \"D\" (defensemen), \"C\" (center), \"L\" (left wing), \"R\" (right wing), or null for all",
                allowed_values: Some(POSITIONS),
                required: false,
                default: None,
                aliases: &[],
            },
            ParamSpec {
                name: "metric",
                kind: ParamKind::Choice,
                description: "Ranking metric. \"ev_points\" means even-strength (5 on 5) points",
                allowed_values: Some(PLAYER_METRICS),
                required: false,
                default: Some("points"),
                aliases: &[],
            },
            count("5", "Number of players to return"),
        ],
    },
    ToolSpec {
        name: "top_goalies",
        description: "Use when the user asks for the best goalies or goalie rankings",
        parameters: &[
            SEASON,
            ParamSpec {
                name: "metric",
                kind: ParamKind::Choice,
                description: "Ranking metric. A lower goals_against_average is better",
                allowed_values: Some(GOALIE_METRICS),
                required: false,
                default: Some("save_pct"),
                aliases: &[],
            },
            count("10", "Number of goalies to return"),
        ],
    },
    ToolSpec {
        name: "get_team_overview",
        description: "Use when the user asks about a team's season",
        parameters: &[TEAM_NAME, SEASON],
    },
    ToolSpec {
        name: "top_teams",
        description: "Use when the user asks for the best teams or standings",
        parameters: &[
            SEASON,
            ParamSpec {
                name: "metric",
                kind: ParamKind::Choice,
                description: "Ranking metric",
                allowed_values: Some(TEAM_METRICS),
                required: false,
                default: Some("points"),
                aliases: &[],
            },
            count("10", "Number of teams to return"),
        ],
    },
    ToolSpec {
        name: "get_team_form",
        description: "Use when the user asks how a team has played lately, its recent games or its form",
        parameters: &[TEAM_NAME, SEASON, count("5", "Number of recent games")],
    },
    ToolSpec {
        name: "get_player_form",
        description: "Use when the user asks how a skater has played in recent games",
        parameters: &[PLAYER_NAME, SEASON, count("5", "Number of recent games")],
    },
    ToolSpec {
        name: "get_goalie_form",
        description: "Use when the user asks how a goalie has played in recent games, e.g. \"Has Demko been good lately?\"",
        parameters: &[PLAYER_NAME, SEASON, count("5", "Number of recent games")],
    },
];

/// Look up a tool by exact name.
pub fn find_tool(name: &str) -> Option<&'static ToolSpec> {
    TOOL_CATALOG.iter().find(|t| t.name == name)
}

/// Render the catalog as prompt text.
pub fn render_catalog() -> String {
    let mut out = String::from("You can use the following tools to answer questions related to the NHL:\n");
    for (i, tool) in TOOL_CATALOG.iter().enumerate() {
        let _ = writeln!(out, "{}. {}:", i + 1, tool.name);
        let _ = writeln!(out, "   {}.", tool.description);
        out.push_str("   Parameters:\n");
        for p in tool.parameters {
            let _ = write!(out, "   - {}", p.name);
            if p.required {
                out.push_str(" (required)");
            }
            let _ = write!(out, ": {}", p.description);
            if let Some(values) = p.allowed_values {
                let quoted: Vec<String> = values.iter().map(|v| format!("\"{}\"", v)).collect();
                let _ = write!(out, ". One of [{}]", quoted.join(", "));
            }
            if let Some(default) = p.default {
                let _ = write!(out, ". Default {}", default);
            }
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_are_unique() {
        let mut names: Vec<&str> = TOOL_CATALOG.iter().map(|t| t.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), TOOL_CATALOG.len());
    }

    #[test]
    fn test_render_lists_every_tool_and_choice() {
        let text = render_catalog();
        for tool in TOOL_CATALOG {
            assert!(text.contains(tool.name));
        }
        assert!(text.contains("\"ev_points\""));
        assert!(text.contains("player_name (required)"));
    }

    #[test]
    fn test_choice_matching_is_case_insensitive() {
        let top = find_tool("top_players").unwrap();
        let position = top.param("position").unwrap();
        assert_eq!(position.canonical("f"), Some("F"));
        assert_eq!(position.canonical("d"), Some("D"));
        assert_eq!(position.canonical("G"), None);
        assert!(find_tool("nope").is_none());
    }
}
