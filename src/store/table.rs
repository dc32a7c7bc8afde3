//! In-memory tabular result type.
//!
//! Every store read returns a [`Table`]: an ordered list of column names and
//! rows of JSON cells. The statistics layer selects, sorts and renames
//! columns on it, and the chat surface renders it as markdown or as an
//! aligned plain-text block for prompts.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use unicode_width::UnicodeWidthStr;

use crate::utilities::string_utils::title_case_column;

/// A rectangular result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create an empty table with the given columns.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Build a table from JSON objects.
    ///
    /// Columns are the union of all keys in first-seen order; absent keys
    /// become `null` cells.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        Self { columns, rows }
    }

    /// Append a row. Short rows are padded with `null`, long rows truncated.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.columns.len(), Value::Null);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `row` for the named column.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }

    /// Keep only the listed columns, in the listed order.
    ///
    /// Columns the table does not have are skipped.
    pub fn select(&self, columns: &[&str]) -> Table {
        let picked: Vec<(usize, &str)> = columns
            .iter()
            .filter_map(|c| self.column_index(c).map(|i| (i, *c)))
            .collect();
        Table {
            columns: picked.iter().map(|(_, c)| c.to_string()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| picked.iter().map(|(i, _)| row[*i].clone()).collect())
                .collect(),
        }
    }

    /// Keep rows for which `keep` returns true.
    pub fn filter_rows<F>(&self, mut keep: F) -> Table
    where
        F: FnMut(&Table, &[Value]) -> bool,
    {
        let rows = self
            .rows
            .iter()
            .filter(|row| keep(self, row))
            .cloned()
            .collect();
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// Cell lookup by column name inside a row slice from this table.
    pub fn cell<'a>(&self, row: &'a [Value], column: &str) -> Option<&'a Value> {
        self.column_index(column).and_then(|i| row.get(i))
    }

    /// Drop rows whose `column` is null. Missing column leaves no rows.
    pub fn drop_null(&self, column: &str) -> Table {
        self.filter_rows(|t, row| t.cell(row, column).map_or(false, |v| !v.is_null()))
    }

    /// Stable sort by one column. Nulls sort last in either direction.
    pub fn sort_by_column(&self, column: &str, descending: bool) -> Table {
        let Some(idx) = self.column_index(column) else {
            return self.clone();
        };
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            let (va, vb) = (&a[idx], &b[idx]);
            match (va.is_null(), vb.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let ord = compare_values(va, vb);
                    if descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                }
            }
        });
        Table {
            columns: self.columns.clone(),
            rows,
        }
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Last `n` rows.
    pub fn tail(&self, n: usize) -> Table {
        let skip = self.rows.len().saturating_sub(n);
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().skip(skip).cloned().collect(),
        }
    }

    /// Rows in reverse order.
    pub fn reversed(&self) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().rev().cloned().collect(),
        }
    }

    /// Rename one column if present.
    pub fn rename(mut self, from: &str, to: &str) -> Table {
        if let Some(idx) = self.column_index(from) {
            self.columns[idx] = to.to_string();
        }
        self
    }

    /// Convert snake_case headers to display headers.
    pub fn with_title_case_headers(mut self) -> Table {
        self.columns = self.columns.iter().map(|c| title_case_column(c)).collect();
        self
    }

    /// Render as a GitHub-flavored markdown table.
    pub fn to_markdown(&self) -> String {
        if self.columns.is_empty() {
            return "_No data._".to_string();
        }
        let mut out = String::new();
        out.push_str("| ");
        out.push_str(&self.columns.join(" | "));
        out.push_str(" |\n|");
        for _ in &self.columns {
            out.push_str(" --- |");
        }
        for row in &self.rows {
            out.push_str("\n| ");
            let cells: Vec<String> = row
                .iter()
                .map(|v| format_cell(v).replace('|', "\\|"))
                .collect();
            out.push_str(&cells.join(" | "));
            out.push_str(" |");
        }
        if self.rows.is_empty() {
            out.push_str("\n\n_No matching rows._");
        }
        out
    }

    /// Render as left-justified, space-aligned text for prompts and terminals.
    pub fn to_plain_text(&self) -> String {
        if self.columns.is_empty() {
            return "No data.".to_string();
        }
        if self.rows.is_empty() {
            return format!("No matching rows. Columns: {}", self.columns.join(", "));
        }
        let formatted: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(format_cell).collect())
            .collect();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, header)| {
                formatted
                    .iter()
                    .map(|row| row[i].width())
                    .chain(std::iter::once(header.width()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::with_capacity(formatted.len() + 1);
        lines.push(pad_line(self.columns.iter().map(String::as_str), &widths));
        for row in &formatted {
            lines.push(pad_line(row.iter().map(String::as_str), &widths));
        }
        lines.join("\n")
    }
}

/// Join cells into one line, left-justifying each to its column width.
fn pad_line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    let parts: Vec<String> = cells
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width.saturating_sub(cell.width());
            format!("{}{}", cell, " ".repeat(pad))
        })
        .collect();
    parts.join("  ").trim_end().to_string()
}

/// Order two JSON values: numbers numerically, everything else as text.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => format_cell(a).cmp(&format_cell(b)),
    }
}

/// Display a cell value.
pub fn format_cell(value: &Value) -> String {
    match value {
        Value::Null => "-".to_string(),
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(f) = n.as_f64() {
                format_float(f)
            } else {
                n.to_string()
            }
        }
        other => other.to_string(),
    }
}

/// Up to three decimals, trailing zeros trimmed.
fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        return format!("{:.0}", f);
    }
    let s = format!("{:.3}", f);
    s.trim_end_matches('0').trim_end_matches('.').to_string()
}
