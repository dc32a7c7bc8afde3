//! Statistics queries behind the hockey tools.
//!
//! Each query reads one or two store tables, narrows them to the columns a
//! reader cares about and renames headers for display. Columns the store does
//! not carry are skipped rather than treated as errors.

pub mod form;

use std::sync::Arc;

use chrono::NaiveDate;

use crate::store::{Predicate, StatsStore, StatsTable, StoreError, Table};

pub use form::TeamForm;

// ---------------------------------------------------------------------------
// Column selections
// ---------------------------------------------------------------------------

const PLAYER_OVERVIEW_COLUMNS: &[&str] = &[
    "skater_full_name",
    "season_id",
    "team_abbrevs",
    "games_played",
    "position_code",
    "goals",
    "assists",
    "points",
    "points_per_game",
    "shots",
    "shooting_pct",
    "plus_minus",
    "time_on_ice_per_game",
];

const GOALIE_COLUMNS: &[&str] = &[
    "goalie_full_name",
    "team_abbrevs",
    "season_id",
    "games_played",
    "wins",
    "losses",
    "save_pct",
    "goals_against_average",
    "shots_against",
    "goals_against",
    "time_on_ice",
];

const TEAM_OVERVIEW_COLUMNS: &[&str] = &[
    "team_full_name",
    "season_id",
    "games_played",
    "wins",
    "losses",
    "ot_losses",
    "points",
    "goals_for",
    "goals_against",
    "power_play_pct",
    "penalty_kill_pct",
];

/// Skater positions counted as forwards.
const FORWARD_POSITIONS: &[&str] = &["C", "L", "R"];

/// Metrics where a lower value ranks higher.
const ASCENDING_METRICS: &[&str] = &["goals_against_average"];

// ---------------------------------------------------------------------------
// StatsService
// ---------------------------------------------------------------------------

/// Read-only statistics queries over an injected store.
#[derive(Clone)]
pub struct StatsService {
    store: Arc<dyn StatsStore>,
}

impl std::fmt::Debug for StatsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsService").finish_non_exhaustive()
    }
}

impl StatsService {
    pub fn new(store: Arc<dyn StatsStore>) -> Self {
        Self { store }
    }

    /// Season line for a skater.
    ///
    /// A name with no skater row is retried as a goalie before the empty
    /// result is accepted.
    pub fn player_overview(&self, player_name: &str, season: &str) -> Result<Table, StoreError> {
        let data = self.store.filter(
            StatsTable::PlayerSeasonStats,
            &Predicate::eq("skater_full_name", player_name).and(Predicate::eq("season_id", season)),
        )?;
        if data.is_empty() {
            log::debug!("No skater row for '{}', trying goalies", player_name);
            return self.goalie(player_name, season);
        }
        Ok(data
            .select(PLAYER_OVERVIEW_COLUMNS)
            .with_title_case_headers()
            .rename("Time On Ice Per Game", "Time On Ice Per Game (sec)"))
    }

    /// Season line for a goalie.
    pub fn goalie(&self, player_name: &str, season: &str) -> Result<Table, StoreError> {
        let data = self.store.filter(
            StatsTable::GoalieSeasonStats,
            &Predicate::eq("goalie_full_name", player_name).and(Predicate::eq("season_id", season)),
        )?;
        Ok(data
            .select(GOALIE_COLUMNS)
            .with_title_case_headers()
            .rename("Time On Ice", "Time On Ice (sec)"))
    }

    /// Top `n` skaters of a season by `metric`, optionally for one position.
    ///
    /// Position `F` selects every forward position.
    pub fn top_players(
        &self,
        season: &str,
        position: Option<&str>,
        metric: &str,
        n: usize,
    ) -> Result<Table, StoreError> {
        let mut data = self.store.filter(
            StatsTable::PlayerSeasonStats,
            &Predicate::eq("season_id", season),
        )?;
        if let Some(position) = position {
            let wanted: Vec<&str> = if position.eq_ignore_ascii_case("F") {
                FORWARD_POSITIONS.to_vec()
            } else {
                vec![position]
            };
            data = data.filter_rows(|t, row| {
                t.cell(row, "position_code")
                    .and_then(|v| v.as_str())
                    .map_or(false, |code| wanted.iter().any(|w| w.eq_ignore_ascii_case(code)))
            });
        }
        Ok(rank(&data, metric, n)
            .select(&["skater_full_name", "position_code", metric, "games_played"])
            .with_title_case_headers())
    }

    /// Top `n` goalies of a season by `metric`.
    pub fn top_goalies(&self, season: &str, metric: &str, n: usize) -> Result<Table, StoreError> {
        let data = self.store.filter(
            StatsTable::GoalieSeasonStats,
            &Predicate::eq("season_id", season),
        )?;
        Ok(rank(&data, metric, n)
            .select(&["goalie_full_name", "team_abbrevs", "games_played", metric])
            .with_title_case_headers())
    }

    /// Season line for a team.
    pub fn team_overview(&self, team_name: &str, season: &str) -> Result<Table, StoreError> {
        let data = self.store.filter(
            StatsTable::TeamSeasonStats,
            &Predicate::eq("team_full_name", team_name).and(Predicate::eq("season_id", season)),
        )?;
        Ok(data.select(TEAM_OVERVIEW_COLUMNS).with_title_case_headers())
    }

    /// Top `n` teams of a season by `metric`.
    pub fn top_teams(&self, season: &str, metric: &str, n: usize) -> Result<Table, StoreError> {
        let data = self.store.filter(
            StatsTable::TeamSeasonStats,
            &Predicate::eq("season_id", season),
        )?;
        Ok(rank(&data, metric, n)
            .select(&["team_full_name", "games_played", metric])
            .with_title_case_headers())
    }

    /// A team's last `n` games played before `today`.
    pub fn team_form(
        &self,
        team_name: &str,
        season: &str,
        n: usize,
        today: NaiveDate,
    ) -> Result<TeamForm, StoreError> {
        let games = self.store.filter(
            StatsTable::Games,
            &Predicate::Or(vec![
                Predicate::eq("home_team_name", team_name),
                Predicate::eq("away_team_name", team_name),
            ])
            .and(Predicate::eq("season", season)),
        )?;
        Ok(form::team_form(&games, team_name, n, today))
    }

    /// A skater's last `n` game-log rows before `today`, most recent first.
    pub fn player_form(
        &self,
        player_name: &str,
        season: &str,
        n: usize,
        today: NaiveDate,
    ) -> Result<Table, StoreError> {
        let logs = self.store.filter(
            StatsTable::PlayerGameLogs,
            &Predicate::eq("skater_full_name", player_name).and(Predicate::eq("season_id", season)),
        )?;
        Ok(form::player_form(&logs, n, today))
    }

    /// A goalie's last `n` game-log rows before `today`, most recent first.
    pub fn goalie_form(
        &self,
        player_name: &str,
        season: &str,
        n: usize,
        today: NaiveDate,
    ) -> Result<Table, StoreError> {
        let logs = self.store.filter(
            StatsTable::GoalieGameLogs,
            &Predicate::eq("goalie_full_name", player_name).and(Predicate::eq("season_id", season)),
        )?;
        Ok(form::goalie_form(&logs, n, today))
    }
}

/// Drop rows without `metric`, sort best first and keep `n`.
fn rank(data: &Table, metric: &str, n: usize) -> Table {
    let descending = !ASCENDING_METRICS.contains(&metric);
    data.drop_null(metric).sort_by_column(metric, descending).head(n)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::InMemoryStatsStore;
    use serde_json::json;

    /// A small league used across the statistics and tool tests.
    pub(crate) fn fixture_store() -> InMemoryStatsStore {
        InMemoryStatsStore::from_json_str(
            &json!({
                "player_season_stats": [
                    {"skater_full_name": "Connor McDavid", "season_id": 20232024, "team_abbrevs": "EDM",
                     "position_code": "C", "games_played": 76, "goals": 32, "assists": 100, "points": 132,
                     "points_per_game": 1.737, "ev_points": 79, "time_on_ice_per_game": 1297.5},
                    {"skater_full_name": "Nikita Kucherov", "season_id": 20232024, "team_abbrevs": "TBL",
                     "position_code": "R", "games_played": 81, "goals": 44, "assists": 100, "points": 144,
                     "points_per_game": 1.778, "ev_points": 85, "time_on_ice_per_game": 1290.0},
                    {"skater_full_name": "Quinn Hughes", "season_id": 20232024, "team_abbrevs": "VAN",
                     "position_code": "D", "games_played": 82, "goals": 17, "assists": 75, "points": 92,
                     "points_per_game": 1.122, "ev_points": 58, "time_on_ice_per_game": 1487.0},
                    {"skater_full_name": "Tim Stützle", "season_id": 20232024, "team_abbrevs": "OTT",
                     "position_code": "C", "games_played": 75, "goals": 18, "assists": 52, "points": 70,
                     "points_per_game": 0.933, "ev_points": null, "time_on_ice_per_game": 1180.0}
                ],
                "goalies": [
                    {"goalie_full_name": "Connor Hellebuyck", "season_id": 20232024, "team_abbrevs": "WPG",
                     "games_played": 60, "wins": 37, "losses": 19, "save_pct": 0.921,
                     "goals_against_average": 2.39, "shutouts": 5, "time_on_ice": 215000},
                    {"goalie_full_name": "Thatcher Demko", "season_id": 20232024, "team_abbrevs": "VAN",
                     "games_played": 51, "wins": 35, "losses": 14, "save_pct": 0.918,
                     "goals_against_average": 2.45, "shutouts": 5, "time_on_ice": 180000}
                ],
                "teams": [
                    {"team_full_name": "Florida Panthers", "season_id": 20232024, "games_played": 82,
                     "wins": 52, "losses": 24, "ot_losses": 6, "points": 110, "goals_for": 268},
                    {"team_full_name": "New York Rangers", "season_id": 20232024, "games_played": 82,
                     "wins": 55, "losses": 23, "ot_losses": 4, "points": 114, "goals_for": 282},
                    {"team_full_name": "Montréal Canadiens", "season_id": 20232024, "games_played": 82,
                     "wins": 30, "losses": 36, "ot_losses": 16, "points": 76, "goals_for": 236}
                ],
                "matches": [
                    {"game_date": "2024-03-01", "season": 20232024, "home_team_name": "Florida Panthers",
                     "away_team_name": "New York Rangers", "home_score": 3, "visiting_score": 2},
                    {"game_date": "2024-03-03", "season": 20232024, "home_team_name": "Montréal Canadiens",
                     "away_team_name": "Florida Panthers", "home_score": 4, "visiting_score": 1},
                    {"game_date": "2024-03-05", "season": 20232024, "home_team_name": "Florida Panthers",
                     "away_team_name": "Montréal Canadiens", "home_score": 5, "visiting_score": 0},
                    {"game_date": "2024-04-10", "season": 20232024, "home_team_name": "New York Rangers",
                     "away_team_name": "Florida Panthers", "home_score": null, "visiting_score": null}
                ],
                "player_game_logs": [
                    {"game_date": "2024-03-01", "season_id": 20232024, "skater_full_name": "Connor McDavid",
                     "opponent_team_abbrev": "CGY", "home_road": "H", "goals": 1, "assists": 2, "points": 3},
                    {"game_date": "2024-03-03", "season_id": 20232024, "skater_full_name": "Connor McDavid",
                     "opponent_team_abbrev": "VAN", "home_road": "R", "goals": 0, "assists": 1, "points": 1},
                    {"game_date": "2024-03-05", "season_id": 20232024, "skater_full_name": "Connor McDavid",
                     "opponent_team_abbrev": "SEA", "home_road": "H", "goals": 2, "assists": 0, "points": 2}
                ],
                "goalie_game_logs": [
                    {"game_date": "2024-02-28", "season_id": 20232024, "goalie_full_name": "Thatcher Demko",
                     "opponent_team_abbrev": "MIN", "home_road": "R", "decision": "L", "shots_against": 30,
                     "saves": 26, "goals_against": 4, "save_pct": 0.8667, "time_on_ice": 3600},
                    {"game_date": "2024-03-04", "season_id": 20232024, "goalie_full_name": "Thatcher Demko",
                     "opponent_team_abbrev": "DAL", "home_road": "H", "decision": "W", "shots_against": 28,
                     "saves": 27, "goals_against": 1, "save_pct": 0.9643, "time_on_ice": 3600},
                    {"game_date": "2024-03-12", "season_id": 20232024, "goalie_full_name": "Thatcher Demko",
                     "opponent_team_abbrev": "EDM", "home_road": "H", "decision": "W", "shots_against": 25,
                     "saves": 25, "goals_against": 0, "save_pct": 1.0, "time_on_ice": 3600}
                ]
            })
            .to_string(),
        )
        .unwrap()
    }

    fn service() -> StatsService {
        StatsService::new(Arc::new(fixture_store()))
    }

    #[test]
    fn test_player_overview_selects_and_renames() {
        let t = service().player_overview("Tim Stutzle", "20232024").unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.columns()[0], "Skater Full Name");
        assert!(t.has_column("Time On Ice Per Game (sec)"));
        // Columns absent from the store are skipped.
        assert!(!t.has_column("Shooting Pct"));
    }

    #[test]
    fn test_player_overview_falls_back_to_goalie() {
        let t = service().player_overview("Connor Hellebuyck", "20232024").unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(0, "Goalie Full Name"), Some(&json!("Connor Hellebuyck")));
        assert!(t.has_column("Time On Ice (sec)"));
    }

    #[test]
    fn test_unknown_player_is_empty_not_error() {
        let t = service().player_overview("Nobody Atall", "20232024").unwrap();
        assert!(t.is_empty());
    }

    #[test]
    fn test_top_players_forwards() {
        let t = service().top_players("20232024", Some("F"), "points", 2).unwrap();
        assert_eq!(
            t.columns(),
            &["Skater Full Name", "Position Code", "Points", "Games Played"]
        );
        assert_eq!(t.get(0, "Skater Full Name"), Some(&json!("Nikita Kucherov")));
        assert_eq!(t.get(1, "Skater Full Name"), Some(&json!("Connor McDavid")));
    }

    #[test]
    fn test_top_players_skips_null_metric() {
        let t = service().top_players("20232024", None, "ev_points", 10).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.get(2, "Skater Full Name"), Some(&json!("Quinn Hughes")));
    }

    #[test]
    fn test_top_goalies_gaa_is_ascending() {
        let t = service().top_goalies("20232024", "goals_against_average", 10).unwrap();
        assert_eq!(t.get(0, "Goalie Full Name"), Some(&json!("Connor Hellebuyck")));
        let t = service().top_goalies("20232024", "save_pct", 1).unwrap();
        assert_eq!(t.get(0, "Goalie Full Name"), Some(&json!("Connor Hellebuyck")));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_top_teams_and_overview() {
        let s = service();
        let top = s.top_teams("20232024", "points", 2).unwrap();
        assert_eq!(top.get(0, "Team Full Name"), Some(&json!("New York Rangers")));
        let overview = s.team_overview("Montreal Canadiens", "20232024").unwrap();
        assert_eq!(overview.get(0, "Points"), Some(&json!(76)));
    }

    #[test]
    fn test_player_form_most_recent_first() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let t = service().player_form("Connor McDavid", "20232024", 2, today).unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0, "Game Date"), Some(&json!("2024-03-05")));
        assert_eq!(t.get(1, "Game Date"), Some(&json!("2024-03-03")));
    }
}
