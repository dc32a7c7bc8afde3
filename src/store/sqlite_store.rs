//! SQLite-backed statistics store.
//!
//! Tables are created on first ingest from the union of record keys, so the
//! store carries whatever columns the upstream feed provides. Reads go
//! through a single connection opened at construction and shared behind a
//! mutex; the orchestration core only ever reads.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use rusqlite::functions::FunctionFlags;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use serde_json::{Map, Value};

use super::table::{format_cell, Table};
use super::{Predicate, StatsStore, StatsTable, StoreError};
use crate::utilities::string_utils::normalize_name;

/// Name of the SQL function applied to both sides of every equality test.
const FOLD_FN: &str = "fold";

/// SQLite statistics store.
pub struct SqliteStatsStore {
    /// Path to the database file (`None` for in-memory databases).
    pub db_path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStatsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStatsStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

impl SqliteStatsStore {
    /// Open (or create) the database at `db_path`.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref().to_path_buf();
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&db_path)?;
        Self::from_connection(conn, Some(db_path))
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?, None)
    }

    fn from_connection(conn: Connection, db_path: Option<PathBuf>) -> Result<Self, StoreError> {
        register_fold_function(&conn)?;
        log::debug!("Opened stats store at {:?}", db_path);
        Ok(Self {
            db_path,
            conn: Mutex::new(conn),
        })
    }

    /// Replace all rows of `season` in `table` with `records`.
    ///
    /// Creates the table on first use and adds any columns the records carry
    /// that the table does not have yet. Returns the number of rows written.
    pub fn replace_season(
        &self,
        table: StatsTable,
        season: &str,
        records: &[Map<String, Value>],
    ) -> Result<usize, StoreError> {
        let incoming = Table::from_records(records);
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let existing = table_columns(&tx, table.name())?;
        if existing.is_empty() {
            let mut columns: Vec<String> = incoming.columns().to_vec();
            if !columns.iter().any(|c| c == table.season_column()) {
                columns.push(table.season_column().to_string());
            }
            let column_sql: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
            tx.execute(
                &format!(
                    "CREATE TABLE {} ({})",
                    quote_ident(table.name()),
                    column_sql.join(", ")
                ),
                [],
            )?;
        } else {
            for column in incoming.columns() {
                if !existing.contains(column) {
                    tx.execute(
                        &format!(
                            "ALTER TABLE {} ADD COLUMN {}",
                            quote_ident(table.name()),
                            quote_ident(column)
                        ),
                        [],
                    )?;
                }
            }
        }

        let deleted = tx.execute(
            &format!(
                "DELETE FROM {} WHERE {}({}) = {}(?1)",
                quote_ident(table.name()),
                FOLD_FN,
                quote_ident(table.season_column()),
                FOLD_FN
            ),
            [season],
        )?;
        if deleted > 0 {
            log::info!("Replaced {} existing rows of {} for {}", deleted, table, season);
        }

        if !incoming.is_empty() {
            let column_sql: Vec<String> = incoming.columns().iter().map(|c| quote_ident(c)).collect();
            let placeholders: Vec<String> =
                (1..=incoming.columns().len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_ident(table.name()),
                column_sql.join(", "),
                placeholders.join(", ")
            );
            let mut stmt = tx.prepare(&sql)?;
            for row in incoming.rows() {
                stmt.execute(params_from_iter(row.iter().map(json_to_sql)))?;
            }
        }

        tx.commit()?;
        Ok(incoming.len())
    }
}

impl StatsStore for SqliteStatsStore {
    fn filter(&self, table: StatsTable, predicate: &Predicate) -> Result<Table, StoreError> {
        let conn = self.conn.lock();
        let columns = table_columns(&conn, table.name())?;
        if columns.is_empty() {
            return Err(StoreError::MissingTable(table.name().to_string()));
        }
        for field in predicate.fields() {
            if !columns.iter().any(|c| c == field) {
                return Err(StoreError::UnknownColumn {
                    table: table.name().to_string(),
                    column: field.to_string(),
                });
            }
        }

        let mut params: Vec<SqlValue> = Vec::new();
        let where_sql = predicate_sql(predicate, &mut params);
        let sql = format!("SELECT * FROM {} WHERE {}", quote_ident(table.name()), where_sql);
        log::debug!("Stats query: {} {:?}", sql, params);

        let mut stmt = conn.prepare(&sql)?;
        let names: Vec<String> = stmt.column_names().iter().map(|s| s.to_string()).collect();
        let width = names.len();
        let mut result = Table::new(names);
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(width);
            for i in 0..width {
                cells.push(sql_to_json(row.get_ref(i)?));
            }
            result.push_row(cells);
        }
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Register the `fold()` SQL function used for folded equality.
fn register_fold_function(conn: &Connection) -> Result<(), StoreError> {
    conn.create_scalar_function(
        FOLD_FN,
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let folded: Option<String> = match ctx.get_raw(0) {
                ValueRef::Null => None,
                other => Some(normalize_name(&format_cell(&sql_to_json(other)))),
            };
            Ok(folded)
        },
    )?;
    Ok(())
}

/// Column names of `table`, empty when the table does not exist.
fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>, StoreError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(columns)
}

/// Render a predicate as SQL, pushing bound values onto `params`.
fn predicate_sql(predicate: &Predicate, params: &mut Vec<SqlValue>) -> String {
    match predicate {
        Predicate::All => "1 = 1".to_string(),
        Predicate::Eq(field, value) => {
            params.push(json_to_sql(value));
            format!(
                "{}({}) = {}(?{})",
                FOLD_FN,
                quote_ident(field),
                FOLD_FN,
                params.len()
            )
        }
        Predicate::And(parts) | Predicate::Or(parts) if parts.is_empty() => {
            if matches!(predicate, Predicate::And(_)) {
                "1 = 1".to_string()
            } else {
                "1 = 0".to_string()
            }
        }
        Predicate::And(parts) => join_sql(parts, " AND ", params),
        Predicate::Or(parts) => join_sql(parts, " OR ", params),
    }
}

fn join_sql(parts: &[Predicate], op: &str, params: &mut Vec<SqlValue>) -> String {
    let rendered: Vec<String> = parts
        .iter()
        .map(|p| format!("({})", predicate_sql(p, params)))
        .collect();
    rendered.join(op)
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn json_to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None => n.as_f64().map_or(SqlValue::Null, SqlValue::Real),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn sql_to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null | ValueRef::Blob(_) => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn seeded() -> SqliteStatsStore {
        let store = SqliteStatsStore::open_in_memory().unwrap();
        store
            .replace_season(
                StatsTable::GoalieSeasonStats,
                "20232024",
                &[
                    record(json!({"goalie_full_name": "Linus Ullmark", "season_id": 20232024, "save_pct": 0.915})),
                    record(json!({"goalie_full_name": "Jeremy Swayman", "season_id": 20232024, "save_pct": 0.916})),
                ],
            )
            .unwrap();
        store
    }

    #[test]
    fn test_filter_by_name_and_season() {
        let store = seeded();
        let p = Predicate::eq("goalie_full_name", "linus ullmark").and(Predicate::eq("season_id", "20232024"));
        let t = store.filter(StatsTable::GoalieSeasonStats, &p).unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(0, "save_pct"), Some(&json!(0.915)));
    }

    #[test]
    fn test_replace_season_overwrites_and_adds_columns() {
        let store = seeded();
        let written = store
            .replace_season(
                StatsTable::GoalieSeasonStats,
                "20232024",
                &[record(json!({"goalie_full_name": "Linus Ullmark", "season_id": 20232024, "wins": 22}))],
            )
            .unwrap();
        assert_eq!(written, 1);
        let t = store
            .filter(StatsTable::GoalieSeasonStats, &Predicate::All)
            .unwrap();
        assert_eq!(t.len(), 1);
        assert_eq!(t.get(0, "wins"), Some(&json!(22)));
        assert_eq!(t.get(0, "save_pct"), Some(&Value::Null));
    }

    #[test]
    fn test_first_write_adds_season_column_and_later_keys() {
        let store = SqliteStatsStore::open_in_memory().unwrap();
        store
            .replace_season(
                StatsTable::Games,
                "20232024",
                &[record(json!({"game_date": "2024-03-01", "home_team_name": "Boston Bruins"}))],
            )
            .unwrap();
        store
            .replace_season(
                StatsTable::Games,
                "20242025",
                &[record(json!({"game_date": "2024-10-12", "home_team_name": "Boston Bruins", "home_score": 3}))],
            )
            .unwrap();

        let t = store.filter(StatsTable::Games, &Predicate::All).unwrap();
        assert_eq!(t.len(), 2);
        assert!(t.has_column("season"));
        assert!(t.has_column("home_score"));
    }

    #[test]
    fn test_missing_table_and_unknown_column() {
        let store = seeded();
        assert!(matches!(
            store.filter(StatsTable::Games, &Predicate::All),
            Err(StoreError::MissingTable(_))
        ));
        assert!(matches!(
            store.filter(StatsTable::GoalieSeasonStats, &Predicate::eq("bogus", 1)),
            Err(StoreError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stats.db");
        {
            let store = SqliteStatsStore::open(&path).unwrap();
            store
                .replace_season(
                    StatsTable::TeamSeasonStats,
                    "20232024",
                    &[record(json!({"team_full_name": "Montréal Canadiens", "season_id": 20232024}))],
                )
                .unwrap();
        }
        let reopened = SqliteStatsStore::open(&path).unwrap();
        let t = reopened
            .filter(
                StatsTable::TeamSeasonStats,
                &Predicate::eq("team_full_name", "Montreal Canadiens"),
            )
            .unwrap();
        assert_eq!(t.len(), 1);
    }
}
