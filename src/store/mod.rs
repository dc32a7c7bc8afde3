//! Statistics store interface.
//!
//! The store is a filterable, columnar-read collaborator: one logical table
//! per kind of statistic, read through exact-equality predicates. The
//! orchestration core never writes to it; the ingest layer does.
//!
//! Two backends are provided:
//! - [`SqliteStatsStore`]: the on-disk store populated by `ingest`.
//! - [`InMemoryStatsStore`]: a fixture store, also used as a test double.

pub mod memory_store;
pub mod sqlite_store;
pub mod table;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use memory_store::InMemoryStatsStore;
pub use sqlite_store::SqliteStatsStore;
pub use table::Table;

// ---------------------------------------------------------------------------
// Logical tables
// ---------------------------------------------------------------------------

/// Logical tables exposed by a statistics store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsTable {
    /// One row per skater and season.
    PlayerSeasonStats,
    /// One row per team and season.
    TeamSeasonStats,
    /// One row per goalie and season.
    GoalieSeasonStats,
    /// One row per regular-season game, with both team names.
    Games,
    /// One row per skater and game.
    PlayerGameLogs,
    /// One row per goalie and game.
    GoalieGameLogs,
}

impl StatsTable {
    /// Every logical table, in ingest order.
    pub const ALL: [StatsTable; 6] = [
        StatsTable::PlayerSeasonStats,
        StatsTable::TeamSeasonStats,
        StatsTable::GoalieSeasonStats,
        StatsTable::Games,
        StatsTable::PlayerGameLogs,
        StatsTable::GoalieGameLogs,
    ];

    /// Physical table name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlayerSeasonStats => "player_season_stats",
            Self::TeamSeasonStats => "teams",
            Self::GoalieSeasonStats => "goalies",
            Self::Games => "matches",
            Self::PlayerGameLogs => "player_game_logs",
            Self::GoalieGameLogs => "goalie_game_logs",
        }
    }

    /// Column holding the season id. The games feed calls it `season`.
    pub fn season_column(&self) -> &'static str {
        match self {
            Self::Games => "season",
            _ => "season_id",
        }
    }
}

impl fmt::Display for StatsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Predicates
// ---------------------------------------------------------------------------

/// Row filter built from exact-equality comparisons.
///
/// Text comparisons are diacritic- and case-folded on both sides by every
/// backend, so `"Lindström"` matches `"Lindstrom"`.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every row.
    All,
    /// `field == value`.
    Eq(String, Value),
    /// Every sub-predicate holds.
    And(Vec<Predicate>),
    /// At least one sub-predicate holds.
    Or(Vec<Predicate>),
}

impl Predicate {
    /// `field == value`.
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Predicate::Eq(field.into(), value.into())
    }

    /// Combine with another predicate using AND.
    pub fn and(self, other: Predicate) -> Self {
        match self {
            Predicate::All => other,
            Predicate::And(mut parts) => {
                parts.push(other);
                Predicate::And(parts)
            }
            first => Predicate::And(vec![first, other]),
        }
    }

    /// Field names referenced by this predicate.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Predicate::All => Vec::new(),
            Predicate::Eq(field, _) => vec![field.as_str()],
            Predicate::And(parts) | Predicate::Or(parts) => {
                parts.iter().flat_map(|p| p.fields()).collect()
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by a statistics store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying database failed.
    #[error("Stats store database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A predicate named a field the table does not have.
    #[error("Unknown column '{column}' in table '{table}'")]
    UnknownColumn { table: String, column: String },

    /// The table has never been populated.
    #[error("Stats table '{0}' is not available; run the ingest command first")]
    MissingTable(String),

    /// Fixture or file I/O failure.
    #[error("Stats store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fixture decoding failure.
    #[error("Stats store data error: {0}")]
    Data(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// StatsStore trait
// ---------------------------------------------------------------------------

/// Read access to the statistics tables.
///
/// Implementations must not mutate state on read: filtering the same table
/// twice with the same predicate yields identical tables.
pub trait StatsStore: Send + Sync {
    /// Return every row of `table` matching `predicate`, with all columns.
    fn filter(&self, table: StatsTable, predicate: &Predicate) -> Result<Table, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_predicate_and_flattens() {
        let p = Predicate::All
            .and(Predicate::eq("a", 1))
            .and(Predicate::eq("b", "x"));
        assert_eq!(
            p,
            Predicate::And(vec![
                Predicate::Eq("a".into(), json!(1)),
                Predicate::Eq("b".into(), json!("x")),
            ])
        );
        assert_eq!(p.fields(), vec!["a", "b"]);
    }

    #[test]
    fn test_table_names() {
        assert_eq!(StatsTable::PlayerSeasonStats.name(), "player_season_stats");
        assert_eq!(StatsTable::Games.season_column(), "season");
        assert_eq!(StatsTable::GoalieSeasonStats.season_column(), "season_id");
    }
}
