//! Dynamically-shaped tables.
//!
//! Common-pool datasets have a schema known only to the backing store, so
//! rows are kept as column name → tagged value maps, built once per load and
//! never mutated afterwards.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One cell of a dynamic row.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// SQL NULL / JSON null
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Real(f64),
    /// Text value
    Text(String),
    /// Raw bytes
    Blob(Vec<u8>),
}

impl CellValue {
    /// Returns true for `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Returns the text payload, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Orders values of the same kind; mixed kinds and nulls sort first.
    fn compare(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Integer(a), CellValue::Integer(b)) => a.cmp(b),
            (CellValue::Real(a), CellValue::Real(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (CellValue::Integer(a), CellValue::Real(b)) => (*a as f64).partial_cmp(b).unwrap_or(Ordering::Equal),
            (CellValue::Real(a), CellValue::Integer(b)) => a.partial_cmp(&(*b as f64)).unwrap_or(Ordering::Equal),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Null, CellValue::Null) => Ordering::Equal,
            (CellValue::Null, _) => Ordering::Less,
            (_, CellValue::Null) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => n.as_f64().map(CellValue::Real).unwrap_or(CellValue::Null),
            },
            serde_json::Value::String(s) => CellValue::Text(s),
            nested => CellValue::Text(nested.to_string()),
        }
    }
}

/// A row of a [`DataTable`].
pub type TableRow = BTreeMap<String, CellValue>;

/// Rows with a schema discovered at load time.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DataTable {
    /// Column names in backing-store order
    pub columns: Vec<String>,
    /// Rows keyed by column name
    pub rows: Vec<TableRow>,
}

impl DataTable {
    /// Creates an empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from JSON objects, taking the column order from the
    /// first object and adding unseen columns as they appear.
    pub fn from_json_rows(objects: Vec<serde_json::Map<String, serde_json::Value>>) -> Self {
        let mut table = DataTable::default();
        for object in objects {
            for name in object.keys() {
                if !table.columns.iter().any(|c| c == name) {
                    table.columns.push(name.clone());
                }
            }
            let row: TableRow = object
                .into_iter()
                .map(|(k, v)| (k, CellValue::from(v)))
                .collect();
            table.rows.push(row);
        }
        table
    }

    /// Appends a row.
    pub fn push_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the cell at `row` / `column`.
    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        self.rows.get(row).and_then(|r| r.get(column))
    }

    /// Sorts rows by `column`, largest first. Missing cells sort last.
    pub fn sort_desc_by(&mut self, column: &str) {
        self.rows.sort_by(|a, b| {
            let null = CellValue::Null;
            let left = a.get(column).unwrap_or(&null);
            let right = b.get(column).unwrap_or(&null);
            right.compare(left)
        });
    }
}
