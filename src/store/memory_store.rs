//! In-memory statistics store.
//!
//! Holds whole tables in memory. Loaded from a JSON fixture shaped as
//! `{"player_season_stats": [{...}, ...], "teams": [...], ...}` or built
//! row by row in tests.

use std::collections::HashMap;

use serde_json::{Map, Value};

use super::table::{format_cell, Table};
use super::{Predicate, StatsStore, StatsTable, StoreError};
use crate::utilities::string_utils::normalize_name;

/// A statistics store backed by in-memory tables.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatsStore {
    tables: HashMap<StatsTable, Table>,
}

impl InMemoryStatsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents of one logical table.
    pub fn insert(&mut self, table: StatsTable, data: Table) {
        self.tables.insert(table, data);
    }

    /// Load tables from a JSON fixture keyed by physical table name.
    ///
    /// Unknown keys are ignored with a warning.
    pub fn from_json_str(content: &str) -> Result<Self, StoreError> {
        let root: HashMap<String, Vec<Map<String, Value>>> = serde_json::from_str(content)?;
        let mut store = Self::new();
        for (name, records) in root {
            match StatsTable::ALL.iter().find(|t| t.name() == name) {
                Some(table) => store.insert(*table, Table::from_records(&records)),
                None => log::warn!("Ignoring unknown fixture table '{}'", name),
            }
        }
        Ok(store)
    }
}

impl StatsStore for InMemoryStatsStore {
    fn filter(&self, table: StatsTable, predicate: &Predicate) -> Result<Table, StoreError> {
        let data = self
            .tables
            .get(&table)
            .ok_or_else(|| StoreError::MissingTable(table.name().to_string()))?;

        for field in predicate.fields() {
            if !data.has_column(field) {
                return Err(StoreError::UnknownColumn {
                    table: table.name().to_string(),
                    column: field.to_string(),
                });
            }
        }

        Ok(data.filter_rows(|t, row| row_matches(t, row, predicate)))
    }
}

/// Evaluate a predicate against one row.
fn row_matches(table: &Table, row: &[Value], predicate: &Predicate) -> bool {
    match predicate {
        Predicate::All => true,
        Predicate::Eq(field, expected) => table
            .cell(row, field)
            .map_or(false, |actual| values_match(actual, expected)),
        Predicate::And(parts) => parts.iter().all(|p| row_matches(table, row, p)),
        Predicate::Or(parts) => parts.iter().any(|p| row_matches(table, row, p)),
    }
}

/// Loose equality: numbers and strings compare by their folded text form,
/// so a numeric `20232024` season matches the string `"20232024"`.
fn values_match(actual: &Value, expected: &Value) -> bool {
    if actual.is_null() || expected.is_null() {
        return actual.is_null() && expected.is_null();
    }
    normalize_name(&format_cell(actual)) == normalize_name(&format_cell(expected))
}
