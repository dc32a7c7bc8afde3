//! Season ingestion from the NHL stats API into the SQLite store.
//!
//! Pulls every table the tools read for one season and replaces that
//! season's rows in the store.

pub mod nhl_api;

use std::fmt;

use serde_json::{Map, Value};
use thiserror::Error;

pub use nhl_api::NhlStatsClient;

use crate::store::{SqliteStatsStore, StatsTable, StoreError};
use crate::utilities::season::{display_season, is_valid_season};

/// Errors raised while ingesting a season.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid season '{0}'; expected e.g. 20232024")]
    InvalidSeason(String),

    #[error("NHL API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected NHL API response: {0}")]
    UnexpectedPayload(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rows written per table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub season: String,
    pub rows: Vec<(StatsTable, usize)>,
}

impl IngestReport {
    pub fn total_rows(&self) -> usize {
        self.rows.iter().map(|(_, n)| n).sum()
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (table, rows) in &self.rows {
            writeln!(f, "{:<22} {:>6}", table.to_string(), rows)?;
        }
        writeln!(
            f,
            "{} rows written for season {}",
            self.total_rows(),
            display_season(&self.season)
        )
    }
}

/// Fetch one season and write it to `store`.
///
/// Nothing is written until every table has been fetched, so a failed
/// download leaves the store as it was.
pub async fn ingest_season(
    client: &NhlStatsClient,
    store: &SqliteStatsStore,
    season: &str,
) -> Result<IngestReport, IngestError> {
    if !is_valid_season(season) {
        return Err(IngestError::InvalidSeason(season.to_string()));
    }
    log::info!("Ingesting season {}", season);

    let fetched = fetch_season(client, season).await?;
    write_season(store, season, fetched)
}

/// Download every table of `season`.
pub async fn fetch_season(
    client: &NhlStatsClient,
    season: &str,
) -> Result<Vec<(StatsTable, Vec<Map<String, Value>>)>, IngestError> {
    let mut fetched = Vec::with_capacity(StatsTable::ALL.len());
    for table in StatsTable::ALL {
        let rows = match table {
            StatsTable::PlayerSeasonStats => client.skater_summary(season).await?,
            StatsTable::GoalieSeasonStats => client.goalie_summary(season).await?,
            StatsTable::TeamSeasonStats => client.team_summary(season).await?,
            StatsTable::PlayerGameLogs => client.skater_game_logs(season).await?,
            StatsTable::GoalieGameLogs => client.goalie_game_logs(season).await?,
            StatsTable::Games => {
                let mut games = client.games(season).await?;
                let names = client.team_names().await?;
                nhl_api::attach_team_names(&mut games, &names);
                games
            }
        };
        fetched.push((table, rows));
    }
    Ok(fetched)
}

/// Replace `season` in `store` with already fetched tables.
pub fn write_season(
    store: &SqliteStatsStore,
    season: &str,
    fetched: Vec<(StatsTable, Vec<Map<String, Value>>)>,
) -> Result<IngestReport, IngestError> {
    let mut report = IngestReport {
        season: season.to_string(),
        rows: Vec::with_capacity(fetched.len()),
    };
    for (table, mut rows) in fetched {
        nhl_api::fill_season(&mut rows, table.season_column(), season);
        let written = store.replace_season(table, season, &rows)?;
        log::info!("Wrote {} rows to {}", written, table);
        report.rows.push((table, written));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Predicate, StatsStore};
    use serde_json::json;
    use std::time::Duration;

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
    }

    fn unreachable_client() -> NhlStatsClient {
        NhlStatsClient::new("http://127.0.0.1:9", Duration::from_secs(1)).unwrap()
    }

    fn rows(value: Value) -> Vec<Map<String, Value>> {
        value
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn test_invalid_season_rejected_before_network() {
        let store = SqliteStatsStore::open_in_memory().unwrap();
        let err = runtime()
            .block_on(ingest_season(&unreachable_client(), &store, "2023"))
            .unwrap_err();
        assert!(matches!(err, IngestError::InvalidSeason(_)));
    }

    #[test]
    fn test_failed_download_leaves_store_untouched() {
        let store = SqliteStatsStore::open_in_memory().unwrap();
        store
            .replace_season(
                StatsTable::TeamSeasonStats,
                "20232024",
                &rows(json!([{"team_full_name": "Boston Bruins", "season_id": 20232024, "points": 109}])),
            )
            .unwrap();

        let err = runtime()
            .block_on(ingest_season(&unreachable_client(), &store, "20232024"))
            .unwrap_err();
        assert!(matches!(err, IngestError::Http(_)));

        let teams = store.filter(StatsTable::TeamSeasonStats, &Predicate::All).unwrap();
        assert_eq!(teams.len(), 1);
        assert!(matches!(
            store.filter(StatsTable::Games, &Predicate::All),
            Err(StoreError::MissingTable(_))
        ));
    }

    #[test]
    fn test_write_season_fills_season_and_reports() {
        let store = SqliteStatsStore::open_in_memory().unwrap();
        let fetched = vec![
            (
                StatsTable::Games,
                rows(json!([
                    {"game_date": "2023-10-10", "home_team_name": "Tampa Bay Lightning", "away_team_name": "Nashville Predators"},
                    {"game_date": "2023-10-11", "home_team_name": "Boston Bruins", "away_team_name": "Chicago Blackhawks"}
                ])),
            ),
            (
                StatsTable::TeamSeasonStats,
                rows(json!([{"team_full_name": "Boston Bruins", "season_id": 20232024}])),
            ),
        ];

        let report = write_season(&store, "20232024", fetched).unwrap();
        assert_eq!(report.total_rows(), 3);

        let games = store
            .filter(StatsTable::Games, &Predicate::eq("season", "20232024"))
            .unwrap();
        assert_eq!(games.len(), 2);

        let text = report.to_string();
        assert!(text.contains("matches"));
        assert!(text.ends_with("3 rows written for season 2023/2024\n"));
    }
}
