//! Structured tables coerced from model output
//!
//! A [`StructuredTable`] is a header plus rows that all have exactly one cell per
//! column. Cell values are typed per column after parsing.

mod coerce;

pub use coerce::to_table;

use serde_json::{Map, Number, Value};
use std::fmt;

/// Type inferred for a whole column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Float,
    Text,
}

/// A single typed cell
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i64),
    Float(f64),
    Text(String),
    Empty,
}

impl CellValue {
    /// JSON representation; empty cells become `null`
    pub fn to_json(&self) -> Value {
        match self {
            Self::Integer(n) => Value::Number((*n).into()),
            Self::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            Self::Text(s) => Value::String(s.clone()),
            Self::Empty => Value::Null,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
            Self::Text(s) => f.write_str(s),
            Self::Empty => Ok(()),
        }
    }
}

/// Rows under a uniform set of columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredTable {
    columns: Vec<String>,
    column_types: Vec<ColumnType>,
    rows: Vec<Vec<CellValue>>,
}

impl StructuredTable {
    /// Column names in header order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Inferred type of every column, in header order
    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    /// Rows in source order; each has one cell per column
    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// A table without rows carries no structured data
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows as column-name → value maps, in header order
    ///
    /// When two columns share a name, the later column wins.
    pub fn records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(column, cell)| (column.clone(), cell.to_json()))
                    .collect()
            })
            .collect()
    }
}
