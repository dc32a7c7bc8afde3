//! Recent-form summaries built from per-game tables.

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};

use crate::store::Table;
use crate::utilities::string_utils::normalize_name;

/// Points awarded for a win in the form summary.
const POINTS_PER_WIN: i64 = 2;

const PLAYER_FORM_COLUMNS: &[&str] = &[
    "game_date",
    "opponent_team_abbrev",
    "home_road",
    "goals",
    "assists",
    "points",
    "plus_minus",
    "shots",
    "time_on_ice_per_game",
];

const GOALIE_FORM_COLUMNS: &[&str] = &[
    "game_date",
    "opponent_team_abbrev",
    "home_road",
    "decision",
    "shots_against",
    "saves",
    "goals_against",
    "save_pct",
    "time_on_ice",
];

/// A team's recent form: one summary row and the games behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamForm {
    pub summary: Table,
    /// Most recent game first.
    pub games: Table,
}

impl TeamForm {
    pub fn into_tables(self) -> Vec<Table> {
        vec![self.summary, self.games]
    }
}

/// Summarize the last `n` completed games of `team_name` before `today`.
///
/// `games` holds rows with `game_date`, `home_team_name`, `away_team_name`,
/// `home_score` and `visiting_score`. Rows with no score or an unreadable
/// date are ignored.
pub fn team_form(games: &Table, team_name: &str, n: usize, today: NaiveDate) -> TeamForm {
    let played = games
        .filter_rows(|t, row| {
            let before_today = t
                .cell(row, "game_date")
                .and_then(parse_game_date)
                .map_or(false, |d| d < today);
            let scored = t.cell(row, "home_score").and_then(score).is_some()
                && t.cell(row, "visiting_score").and_then(score).is_some();
            before_today && scored
        })
        .sort_by_column("game_date", false)
        .tail(n);

    let wanted = normalize_name(team_name);
    let (mut wins, mut losses, mut goals_for, mut goals_against) = (0i64, 0i64, 0i64, 0i64);
    let mut list = Table::new(["Date", "Opponent", "Home/Away", "Result", "Score"]);

    for row in played.rows() {
        let text = |column: &str| {
            played
                .cell(row, column)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let home_score = played.cell(row, "home_score").and_then(score).unwrap_or(0);
        let away_score = played.cell(row, "visiting_score").and_then(score).unwrap_or(0);
        let is_home = normalize_name(&text("home_team_name")) == wanted;

        let (gf, ga, opponent, venue) = if is_home {
            (home_score, away_score, text("away_team_name"), "Home")
        } else {
            (away_score, home_score, text("home_team_name"), "Away")
        };
        goals_for += gf;
        goals_against += ga;
        let result = if gf > ga {
            wins += 1;
            "W"
        } else {
            losses += 1;
            "L"
        };

        let date = played
            .cell(row, "game_date")
            .and_then(parse_game_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        list.push_row(vec![
            json!(date),
            json!(opponent),
            json!(venue),
            json!(result),
            json!(format!("{}-{}", gf, ga)),
        ]);
    }

    let played_count = played.len() as i64;
    let points = wins * POINTS_PER_WIN;
    let points_per_game = if played_count > 0 {
        json!(((points as f64 / played_count as f64) * 100.0).round() / 100.0)
    } else {
        Value::Null
    };

    let mut summary = Table::new([
        "Team",
        "Games",
        "Wins",
        "Losses",
        "Points",
        "Points Per Game",
        "Goals For",
        "Goals Against",
        "Goal Diff",
    ]);
    summary.push_row(vec![
        json!(team_name),
        json!(played_count),
        json!(wins),
        json!(losses),
        json!(points),
        points_per_game,
        json!(goals_for),
        json!(goals_against),
        json!(goals_for - goals_against),
    ]);

    TeamForm {
        summary,
        games: list.reversed(),
    }
}

/// A skater's last `n` game-log rows before `today`, most recent first.
pub fn player_form(logs: &Table, n: usize, today: NaiveDate) -> Table {
    recent_games(logs, n, today)
        .select(PLAYER_FORM_COLUMNS)
        .with_title_case_headers()
        .rename("Time On Ice Per Game", "Time On Ice Per Game (sec)")
}

/// A goalie's last `n` game-log rows before `today`, most recent first.
pub fn goalie_form(logs: &Table, n: usize, today: NaiveDate) -> Table {
    recent_games(logs, n, today)
        .select(GOALIE_FORM_COLUMNS)
        .with_title_case_headers()
        .rename("Time On Ice", "Time On Ice (sec)")
}

fn recent_games(logs: &Table, n: usize, today: NaiveDate) -> Table {
    logs.filter_rows(|t, row| {
        t.cell(row, "game_date")
            .and_then(parse_game_date)
            .map_or(false, |d| d < today)
    })
    .sort_by_column("game_date", false)
    .tail(n)
    .reversed()
}

/// Read the date part of an ISO date or timestamp cell.
fn parse_game_date(value: &Value) -> Option<NaiveDate> {
    let text = value.as_str()?;
    let date_part = text.get(..10).unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn score(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
}
