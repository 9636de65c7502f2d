//! Dataset Module
//!
//! In-memory shapes the paginator understands: uniform records (tables) and
//! ordered key-value mappings.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ToolError};

/// Column name used when a table is built from bare values.
pub const VALUE_COLUMN: &str = "value";

// == Data Kind ==
/// How a provider payload should be rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataKind {
    Table,
    KeyValue,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Table => f.write_str("table"),
            DataKind::KeyValue => f.write_str("key-value"),
        }
    }
}

// == Table ==
/// Rows of cells under a shared header.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Builds a table, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        if let Some((index, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(ToolError::InvalidArgument(format!(
                "row {} has {} cells but the table has {} columns",
                index,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Builds a table from JSON records.
    ///
    /// Columns are the union of record keys in first-seen order. Records
    /// missing a column get `null` in that cell.
    pub fn from_records(records: Vec<Map<String, Value>>) -> Self {
        let mut seen = HashSet::new();
        let mut columns = Vec::new();
        for record in &records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
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

    /// Rows as JSON objects keyed by column name.
    pub fn to_records(&self) -> Vec<Value> {
        self.rows
            .iter()
            .map(|row| {
                let record: Map<String, Value> = self
                    .columns
                    .iter()
                    .cloned()
                    .zip(row.iter().cloned())
                    .collect();
                Value::Object(record)
            })
            .collect()
    }

    /// Keeps only the named columns, in the order given. Unknown names are
    /// skipped.
    pub fn project(&self, names: &[String]) -> Self {
        let indices: Vec<usize> = names
            .iter()
            .filter_map(|name| self.columns.iter().position(|column| column == name))
            .collect();

        Self {
            columns: indices.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }
}

// == Dataset ==
/// Read-only input to the paginator.
#[derive(Debug, Clone, PartialEq)]
pub enum Dataset {
    Table(Table),
    KeyValue(Map<String, Value>),
}

impl Dataset {
    /// Interprets a provider payload as the requested kind of data.
    ///
    /// * arrays of objects become tables, arrays of scalars become a single
    ///   `value` column;
    /// * an object becomes a key-value mapping, or a one-row table when a
    ///   table is requested;
    /// * `null` is an empty dataset of the requested kind.
    ///
    /// Anything else is an [`ToolError::InvalidArgument`].
    pub fn from_json(value: Value, kind: DataKind) -> Result<Self> {
        match (kind, value) {
            (DataKind::Table, Value::Null) => Ok(Dataset::Table(Table::default())),
            (DataKind::KeyValue, Value::Null) => Ok(Dataset::KeyValue(Map::new())),
            (DataKind::KeyValue, Value::Object(map)) => Ok(Dataset::KeyValue(map)),
            (DataKind::Table, Value::Object(map)) => {
                Ok(Dataset::Table(Table::from_records(vec![map])))
            }
            (DataKind::Table, Value::Array(items)) => table_from_array(items).map(Dataset::Table),
            (kind, other) => Err(ToolError::InvalidArgument(format!(
                "cannot render {} as {} data",
                shape_name(&other),
                kind
            ))),
        }
    }

    pub fn kind(&self) -> DataKind {
        match self {
            Dataset::Table(_) => DataKind::Table,
            Dataset::KeyValue(_) => DataKind::KeyValue,
        }
    }

    /// Number of paginated items: rows or top-level keys.
    pub fn len(&self) -> usize {
        match self {
            Dataset::Table(table) => table.len(),
            Dataset::KeyValue(map) => map.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// JSON form used for export: an array of records or an object.
    pub fn to_json(&self) -> Value {
        match self {
            Dataset::Table(table) => Value::Array(table.to_records()),
            Dataset::KeyValue(map) => Value::Object(map.clone()),
        }
    }

    /// Restricts the dataset to the named fields (columns or keys), in the
    /// requested order.
    pub fn select_fields(&self, fields: &[String]) -> Self {
        match self {
            Dataset::Table(table) => Dataset::Table(table.project(fields)),
            Dataset::KeyValue(map) => Dataset::KeyValue(
                fields
                    .iter()
                    .filter_map(|field| map.get(field).map(|value| (field.clone(), value.clone())))
                    .collect(),
            ),
        }
    }
}

fn table_from_array(items: Vec<Value>) -> Result<Table> {
    if items.iter().all(Value::is_object) {
        let records = items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .collect();
        return Ok(Table::from_records(records));
    }

    if items.iter().all(|item| !item.is_object() && !item.is_array()) {
        let rows = items.into_iter().map(|item| vec![item]).collect();
        return Table::new(vec![VALUE_COLUMN.to_string()], rows);
    }

    Err(ToolError::InvalidArgument(
        "array items must be all records or all scalar values".to_string(),
    ))
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
