//! Client for the public NHL stats REST API.
//!
//! Every endpoint answers `{"data": [...], "total": n}` with camelCase keys.
//! Rows are returned as snake_case JSON objects ready for the store.

use std::collections::HashMap;
use std::time::Duration;

use serde_json::{Map, Value};

use super::IngestError;
use crate::utilities::string_utils::to_snake_case;

/// Regular-season game type id.
const REGULAR_SEASON: u8 = 2;

/// Async client for `https://api.nhle.com/stats/rest`.
#[derive(Debug, Clone)]
pub struct NhlStatsClient {
    base_url: String,
    client: reqwest::Client,
}

impl NhlStatsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/en/{}", self.base_url, path)
    }

    /// GET one endpoint and return its rows with snake_case keys.
    async fn fetch(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<Map<String, Value>>, IngestError> {
        let url = self.endpoint(path);
        log::debug!("GET {} {:?}", url, query);
        let payload: Value = self
            .client
            .get(&url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let rows = records_from_payload(payload, path)?;
        log::info!("Fetched {} rows from {}", rows.len(), path);
        Ok(rows)
    }

    fn season_summary_query(season: &str, per_game: bool) -> Vec<(&'static str, String)> {
        vec![
            ("isAggregate", "false".to_string()),
            ("isGame", per_game.to_string()),
            (
                "cayenneExp",
                format!("gameTypeId={} and seasonId={}", REGULAR_SEASON, season),
            ),
            ("limit", "-1".to_string()),
        ]
    }

    /// Skater season totals.
    pub async fn skater_summary(&self, season: &str) -> Result<Vec<Map<String, Value>>, IngestError> {
        self.fetch("skater/summary", &Self::season_summary_query(season, false)).await
    }

    /// Goalie season totals.
    pub async fn goalie_summary(&self, season: &str) -> Result<Vec<Map<String, Value>>, IngestError> {
        self.fetch("goalie/summary", &Self::season_summary_query(season, false)).await
    }

    /// Team season totals.
    pub async fn team_summary(&self, season: &str) -> Result<Vec<Map<String, Value>>, IngestError> {
        self.fetch("team/summary", &Self::season_summary_query(season, false)).await
    }

    /// One row per skater and game.
    pub async fn skater_game_logs(&self, season: &str) -> Result<Vec<Map<String, Value>>, IngestError> {
        self.fetch("skater/summary", &Self::season_summary_query(season, true)).await
    }

    /// One row per goalie and game.
    pub async fn goalie_game_logs(&self, season: &str) -> Result<Vec<Map<String, Value>>, IngestError> {
        self.fetch("goalie/summary", &Self::season_summary_query(season, true)).await
    }

    /// Regular-season games of a season.
    pub async fn games(&self, season: &str) -> Result<Vec<Map<String, Value>>, IngestError> {
        let query = [(
            "cayenneExp",
            format!("gameType={} and season={}", REGULAR_SEASON, season),
        )];
        self.fetch("game", &query).await
    }

    /// Team id to full name.
    pub async fn team_names(&self) -> Result<HashMap<i64, String>, IngestError> {
        let rows = self.fetch("team", &[]).await?;
        Ok(team_name_index(&rows))
    }
}

// ---------------------------------------------------------------------------
// Row shaping
// ---------------------------------------------------------------------------

/// Pull the `data` array out of a response and snake_case its keys.
pub fn records_from_payload(payload: Value, path: &str) -> Result<Vec<Map<String, Value>>, IngestError> {
    let Some(Value::Array(rows)) = payload.get("data").cloned() else {
        return Err(IngestError::UnexpectedPayload(format!(
            "{}: response has no \"data\" array",
            path
        )));
    };
    Ok(rows
        .into_iter()
        .filter_map(|row| match row {
            Value::Object(object) => Some(snake_case_keys(object)),
            _ => None,
        })
        .collect())
}

fn snake_case_keys(object: Map<String, Value>) -> Map<String, Value> {
    object
        .into_iter()
        .map(|(k, v)| (to_snake_case(&k), v))
        .collect()
}

/// Set `column` to `season` on rows that lack it.
pub fn fill_season(rows: &mut [Map<String, Value>], column: &str, season: &str) {
    for row in rows {
        let missing = row.get(column).map_or(true, Value::is_null);
        if missing {
            row.insert(column.to_string(), Value::String(season.to_string()));
        }
    }
}

/// Index team rows (`id`, `full_name`) by id.
pub fn team_name_index(rows: &[Map<String, Value>]) -> HashMap<i64, String> {
    rows.iter()
        .filter_map(|row| {
            let id = row.get("id").and_then(Value::as_i64)?;
            let name = row.get("full_name").and_then(Value::as_str)?;
            Some((id, name.to_string()))
        })
        .collect()
}

/// Add `home_team_name` and `away_team_name` to game rows.
pub fn attach_team_names(games: &mut [Map<String, Value>], names: &HashMap<i64, String>) {
    for game in games {
        for (id_key, name_key) in [
            ("home_team_id", "home_team_name"),
            ("visiting_team_id", "away_team_name"),
        ] {
            let name = game
                .get(id_key)
                .and_then(Value::as_i64)
                .and_then(|id| names.get(&id))
                .map_or(Value::Null, |n| Value::String(n.clone()));
            game.insert(name_key.to_string(), name);
        }
    }
}
