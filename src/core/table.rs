//! Tabular model for upstream responses

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

/// A single cell as received from an upstream table.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    Bool(bool),
    Str(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Composite value (nested list or object).
    Json(Value),
}

impl From<Value> for RawValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => RawValue::Null,
            Value::Bool(b) => RawValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RawValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    RawValue::UInt(u)
                } else {
                    n.as_f64().map_or(RawValue::Null, RawValue::Float)
                }
            }
            Value::String(s) => RawValue::Str(s),
            other => RawValue::Json(other),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Str(value.to_string())
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Int(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Float(value)
    }
}

/// Column-ordered table. Every row holds exactly one cell per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<RawValue>>,
}

impl Table {
    /// Builds a table from JSON row objects. Columns are the union of keys in
    /// first-seen order; keys missing from a row become null cells. Non-object
    /// rows are skipped.
    pub fn from_json_rows(rows: Vec<Value>) -> Self {
        let mut table = Table::default();
        for row in rows {
            let Value::Object(map) = row else {
                continue;
            };
            let mut cells = vec![RawValue::Null; table.columns.len()];
            for (key, value) in map {
                match table.column_index(&key) {
                    Some(idx) => cells[idx] = value.into(),
                    None => {
                        table.columns.push(key);
                        for existing in &mut table.rows {
                            existing.push(RawValue::Null);
                        }
                        cells.push(value.into());
                    }
                }
            }
            table.rows.push(cells);
        }
        table
    }

    /// Interprets an upstream JSON payload: arrays are row lists, a single
    /// object is a one-row table and anything else is empty.
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Array(rows) => Self::from_json_rows(rows),
            Value::Object(_) => Self::from_json_rows(vec![value]),
            _ => Table::default(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<RawValue>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn column_values(&self, idx: usize) -> impl Iterator<Item = &RawValue> {
        self.rows.iter().filter_map(move |row| row.get(idx))
    }

    pub fn rename_column(&mut self, idx: usize, name: &str) {
        if let Some(column) = self.columns.get_mut(idx) {
            *column = name.to_string();
        }
    }

    /// Replaces every cell of a column with the output of `f`.
    pub fn map_column(&mut self, idx: usize, mut f: impl FnMut(&RawValue) -> RawValue) {
        for row in &mut self.rows {
            if let Some(cell) = row.get_mut(idx) {
                *cell = f(cell);
            }
        }
    }

    /// Adds a column holding the same value in every row.
    pub fn add_constant_column(&mut self, name: &str, value: RawValue) {
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(value.clone());
        }
    }

    /// Keeps only the rows for which `keep` returns true.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(&[RawValue]) -> bool) {
        self.rows.retain(|row| keep(row));
    }

    /// Iterates rows as `(column, cell)` pairs.
    pub fn records(&self) -> impl Iterator<Item = impl Iterator<Item = (&str, &RawValue)>> {
        self.rows.iter().map(move |row| {
            self.columns
                .iter()
                .map(String::as_str)
                .zip(row.iter())
        })
    }
}
