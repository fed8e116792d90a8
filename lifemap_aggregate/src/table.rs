// Copyright 2025 the Lifemap Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Minimal columnar tables: the input and output shape of every aggregation.

use core::fmt;
use std::borrow::Cow;

use hashbrown::HashSet;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::error::AggregateError;

/// Name of the id column in every aggregated output.
pub const ID_COLUMN: &str = "taxid";

static NULL: Value = Value::Null;
static EMPTY: Column = Column::Int(Vec::new());

/// Kind of values held by a [`Column`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// 64-bit signed integers.
    Int,
    /// 64-bit floats.
    Float,
    /// Strings.
    Str,
    /// Booleans.
    Bool,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "integer",
            Self::Float => "float",
            Self::Str => "string",
            Self::Bool => "boolean",
        })
    }
}

/// A homogeneous, non-null column.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum Column {
    /// Integer values.
    Int(Vec<i64>),
    /// Float values.
    Float(Vec<f64>),
    /// String values.
    Str(Vec<String>),
    /// Boolean values.
    Bool(Vec<bool>),
}

impl Column {
    /// Number of rows.
    pub fn len(&self) -> usize {
        match self {
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Str(v) => v.len(),
            Self::Bool(v) => v.len(),
        }
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Kind of the values.
    pub fn kind(&self) -> ColumnKind {
        match self {
            Self::Int(_) => ColumnKind::Int,
            Self::Float(_) => ColumnKind::Float,
            Self::Str(_) => ColumnKind::Str,
            Self::Bool(_) => ColumnKind::Bool,
        }
    }

    /// Integer values, if this is an integer column.
    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            Self::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Float values, if this is a float column.
    pub fn as_floats(&self) -> Option<&[f64]> {
        match self {
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    /// String values, if this is a string column.
    pub fn as_strs(&self) -> Option<&[String]> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    /// Value at `row` as JSON.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn json_value(&self, row: usize) -> Value {
        match self {
            Self::Int(v) => Value::from(v[row]),
            Self::Float(v) => Value::from(v[row]),
            Self::Str(v) => Value::from(v[row].as_str()),
            Self::Bool(v) => Value::from(v[row]),
        }
    }

    /// Value at `row` rendered as a category label. Floats are not categories.
    pub(crate) fn label(&self, row: usize) -> Option<Cow<'_, str>> {
        match self {
            Self::Int(v) => Some(Cow::Owned(v[row].to_string())),
            Self::Str(v) => Some(Cow::Borrowed(v[row].as_str())),
            Self::Bool(v) => Some(Cow::Borrowed(if v[row] { "true" } else { "false" })),
            Self::Float(_) => None,
        }
    }

    /// Gather `rows`, in order, into a new column of the same kind.
    pub(crate) fn take(&self, rows: &[usize]) -> Self {
        match self {
            Self::Int(v) => Self::Int(rows.iter().map(|&r| v[r]).collect()),
            Self::Float(v) => Self::Float(rows.iter().map(|&r| v[r]).collect()),
            Self::Str(v) => Self::Str(rows.iter().map(|&r| v[r].clone()).collect()),
            Self::Bool(v) => Self::Bool(rows.iter().map(|&r| v[r]).collect()),
        }
    }

    fn from_json_values(name: &str, values: &[&Value]) -> Result<Self, AggregateError> {
        if values.iter().all(|v| v.is_i64()) {
            Ok(Self::Int(values.iter().filter_map(|v| v.as_i64()).collect()))
        } else if values.iter().all(|v| v.is_number()) {
            Ok(Self::Float(values.iter().filter_map(|v| v.as_f64()).collect()))
        } else if values.iter().all(|v| v.is_string()) {
            Ok(Self::Str(
                values
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(str::to_owned)
                    .collect(),
            ))
        } else if values.iter().all(|v| v.is_boolean()) {
            Ok(Self::Bool(values.iter().filter_map(|v| v.as_bool()).collect()))
        } else {
            Err(AggregateError::MixedValues(name.to_owned()))
        }
    }
}

/// Ordered, named columns of equal length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    /// An empty table with no columns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, builder style.
    pub fn with_column(
        mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<Self, AggregateError> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Append a column. Names must be unique and lengths must match.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> Result<(), AggregateError> {
        let name = name.into();
        if self.names.contains(&name) {
            return Err(AggregateError::ColumnCollision(name));
        }
        if !self.columns.is_empty() && column.len() != self.height() {
            return Err(AggregateError::RaggedColumns {
                column: name,
                len: column.len(),
                height: self.height(),
            });
        }
        self.names.push(name);
        self.columns.push(column);
        Ok(())
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Column names in order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.names.iter().map(String::as_str)
    }

    /// Named columns in order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> + '_ {
        self.names.iter().map(String::as_str).zip(&self.columns)
    }

    /// Column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    /// Column by name, or [`AggregateError::MissingColumn`].
    pub fn require(&self, name: &str) -> Result<&Column, AggregateError> {
        self.column(name)
            .ok_or_else(|| AggregateError::MissingColumn(name.to_owned()))
    }

    /// Whether the table has no columns at all, as parsed from an empty array
    /// of records. Such a table has no rows and fits any schema.
    pub fn is_blank(&self) -> bool {
        self.columns.is_empty()
    }

    /// Integer column by name; a blank table has no ids.
    pub(crate) fn ids(&self, name: &str) -> Result<&[i64], AggregateError> {
        if self.is_blank() {
            return Ok(&[]);
        }
        self.ints(name)
    }

    /// Column by name; a blank table yields the same empty column as an
    /// empty JSON array.
    pub(crate) fn require_or_empty(&self, name: &str) -> Result<&Column, AggregateError> {
        if self.is_blank() {
            return Ok(&EMPTY);
        }
        self.require(name)
    }

    /// Integer column by name.
    pub fn ints(&self, name: &str) -> Result<&[i64], AggregateError> {
        let column = self.require(name)?;
        column.as_ints().ok_or_else(|| AggregateError::ColumnType {
            column: name.to_owned(),
            expected: "integer",
            found: column.kind(),
        })
    }

    /// Build a table from JSON in records orientation (array of objects) or
    /// columns orientation (object of arrays).
    pub fn from_json(value: &Value) -> Result<Self, AggregateError> {
        match value {
            Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(record) => records.push(record),
                        other => {
                            return Err(AggregateError::InvalidShape {
                                found: array_of(other),
                            });
                        }
                    }
                }
                Self::from_record_refs(&records)
            }
            Value::Object(columns) => Self::from_columns(columns),
            other => Err(AggregateError::InvalidShape {
                found: json_kind(other),
            }),
        }
    }

    /// Build a table from row records. Columns follow the records' key order.
    pub fn from_records(records: &[Map<String, Value>]) -> Result<Self, AggregateError> {
        let refs: Vec<&Map<String, Value>> = records.iter().collect();
        Self::from_record_refs(&refs)
    }

    /// Build a table from a map of column name to JSON array.
    pub fn from_columns(columns: &Map<String, Value>) -> Result<Self, AggregateError> {
        let mut table = Self::new();
        for (name, values) in columns {
            let Value::Array(values) = values else {
                return Err(AggregateError::InvalidShape {
                    found: "an object of non-array values",
                });
            };
            let refs: Vec<&Value> = values.iter().collect();
            table.push_column(name.clone(), Column::from_json_values(name, &refs)?)?;
        }
        Ok(table)
    }

    /// Rows as JSON objects.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        (0..self.height())
            .map(|row| {
                self.columns()
                    .map(|(name, column)| (name.to_owned(), column.json_value(row)))
                    .collect()
            })
            .collect()
    }

    fn from_record_refs(records: &[&Map<String, Value>]) -> Result<Self, AggregateError> {
        let mut names: Vec<&str> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.as_str()) {
                    names.push(key.as_str());
                }
            }
        }
        let mut table = Self::new();
        for name in names {
            let values: Vec<&Value> = records
                .iter()
                .map(|record| record.get(name).unwrap_or(&NULL))
                .collect();
            table.push_column(name, Column::from_json_values(name, &values)?)?;
        }
        Ok(table)
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.width()))?;
        for (name, column) in self.columns() {
            map.serialize_entry(name, column)?;
        }
        map.end()
    }
}

/// Anything the aggregators accept as tabular input.
pub trait TableSource {
    /// View the data as a [`Table`], converting if needed.
    fn to_table(&self) -> Result<Cow<'_, Table>, AggregateError>;
}

impl TableSource for Table {
    fn to_table(&self) -> Result<Cow<'_, Table>, AggregateError> {
        Ok(Cow::Borrowed(self))
    }
}

impl TableSource for Value {
    fn to_table(&self) -> Result<Cow<'_, Table>, AggregateError> {
        Table::from_json(self).map(Cow::Owned)
    }
}

impl TableSource for [Map<String, Value>] {
    fn to_table(&self) -> Result<Cow<'_, Table>, AggregateError> {
        Table::from_records(self).map(Cow::Owned)
    }
}

impl TableSource for Vec<Map<String, Value>> {
    fn to_table(&self) -> Result<Cow<'_, Table>, AggregateError> {
        Table::from_records(self).map(Cow::Owned)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn array_of(item: &Value) -> &'static str {
    match item {
        Value::Null => "an array containing null",
        Value::Bool(_) => "an array of booleans",
        Value::Number(_) => "an array of numbers",
        Value::String(_) => "an array of strings",
        Value::Array(_) => "an array of arrays",
        Value::Object(_) => "an array of objects",
    }
}
