//! Tabular row model shared by every pipeline stage.
//!
//! Ownership model:
//! - `Row` is an ordered column-name → cell map; ordering matters because the
//!   canonical output schema is positional.
//! - `RecordSet` pairs the tabular rows of one record type with the original
//!   geometry per map label, so spatial export can rejoin geometry after the
//!   tabular side has been folded and normalized.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use geo::Geometry;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::record_type::RecordType;
use crate::types::{ColumnName, MapLabel};

/// Column name carrying the natural record key.
pub const MAP_LABEL: &str = "MAP_LABEL";
/// Column name carrying WKT geometry in raw query rows.
pub const SHAPE: &str = "SHAPE";

/// A single typed cell value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Absent/unknown value.
    Null,
    /// Free-form text.
    Text(String),
    /// Integer value (ids, counters).
    Int(i64),
    /// Floating-point measure (hectares, kilometres).
    Float(f64),
    /// Calendar date.
    Date(NaiveDate),
}

impl CellValue {
    /// Whether this cell is absent.
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Text view of the cell, when it holds text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Date view of the cell, when it holds a date.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(value) => Some(*value),
            _ => None,
        }
    }

    /// Integer view of the cell; text cells parse leniently.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            CellValue::Int(value) => Some(*value),
            CellValue::Float(value) => Some(*value as i64),
            CellValue::Text(value) => value.trim().parse().ok(),
            _ => None,
        }
    }

    /// Render the cell as report text. `Null` renders empty.
    pub fn render(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Text(value) => value.clone(),
            CellValue::Int(value) => value.to_string(),
            CellValue::Float(value) => value.to_string(),
            CellValue::Date(value) => value.format("%Y-%m-%d").to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

/// One tabular record row with stable column order.
pub type Row = IndexMap<ColumnName, CellValue>;

/// The map label of a row, when present and textual.
pub fn row_label(row: &Row) -> Option<&str> {
    row.get(MAP_LABEL).and_then(CellValue::as_text)
}

/// Text value of `column`, when present.
pub fn cell_text<'a>(row: &'a Row, column: &str) -> Option<&'a str> {
    row.get(column).and_then(CellValue::as_text)
}

/// Date value of `column`, when present.
pub fn cell_date(row: &Row, column: &str) -> Option<NaiveDate> {
    row.get(column).and_then(CellValue::as_date)
}

/// Integer value of `column`, when present.
pub fn cell_int(row: &Row, column: &str) -> Option<i64> {
    row.get(column).and_then(CellValue::as_int)
}

/// Fetched rows of one record type plus per-label source geometry.
///
/// Rows no longer carry the `SHAPE` column; the parsed geometry lives in
/// `geometries` keyed by map label (first geometry wins for duplicated
/// labels, which only differ by join fan-out, never by shape).
#[derive(Clone, Debug)]
pub struct RecordSet {
    /// The record type these rows belong to.
    pub record_type: RecordType,
    /// Tabular rows, including join fan-out still to be folded.
    pub rows: Vec<Row>,
    /// Source geometry per map label.
    pub geometries: BTreeMap<MapLabel, Geometry<f64>>,
}

impl RecordSet {
    /// An empty set for `record_type`.
    pub fn empty(record_type: RecordType) -> Self {
        Self {
            record_type,
            rows: Vec::new(),
            geometries: BTreeMap::new(),
        }
    }

    /// Whether the fetch produced no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct map labels in first-appearance order.
    pub fn labels(&self) -> Vec<MapLabel> {
        let mut seen = std::collections::BTreeSet::new();
        let mut labels = Vec::new();
        for row in &self.rows {
            if let Some(label) = row_label(row) {
                if seen.insert(label.to_string()) {
                    labels.push(label.to_string());
                }
            }
        }
        labels
    }
}
