//! Canonical per-type output schemas.
//!
//! The normalizer is the last tabular stage: it renames source columns where
//! a type's query projects under a different name, selects exactly the type's
//! canonical columns in order (absent columns become `Null`), and sorts rows
//! by map label so output is reproducible.

use crate::record::{row_label, CellValue, Row};
use crate::record_type::RecordType;
use crate::types::ColumnName;

/// The normalized, column-ordered, fan-out-free rows of one record type.
#[derive(Clone, Debug)]
pub struct CanonicalReport {
    /// Record type this report covers.
    pub record_type: RecordType,
    /// Column order; equals `record_type.columns()` exactly.
    pub columns: Vec<ColumnName>,
    /// One row per map label, sorted ascending by label.
    pub rows: Vec<Row>,
}

impl CanonicalReport {
    /// Rendered cell values of `column` across rows, in row order.
    pub fn column_values(&self, column: &str) -> Vec<String> {
        self.rows
            .iter()
            .map(|row| row.get(column).map(CellValue::render).unwrap_or_default())
            .collect()
    }
}

/// Map enriched rows into the type's canonical schema.
pub fn normalize(record_type: RecordType, rows: Vec<Row>) -> CanonicalReport {
    let columns: Vec<ColumnName> = record_type
        .columns()
        .iter()
        .map(|column| column.to_string())
        .collect();

    let mut normalized: Vec<Row> = rows
        .into_iter()
        .map(|mut row| {
            for (source, target) in record_type.renames() {
                if let Some(value) = row.shift_remove(*source) {
                    row.insert(target.to_string(), value);
                }
            }
            let mut out = Row::new();
            for column in &columns {
                let value = if *column == "FILE_TYPE_CODE" && record_type.clears_file_type_code() {
                    CellValue::Null
                } else {
                    row.get(column).cloned().unwrap_or(CellValue::Null)
                };
                out.insert(column.clone(), value);
            }
            out
        })
        .collect();

    normalized.sort_by(|a, b| {
        let left = row_label(a).unwrap_or_default();
        let right = row_label(b).unwrap_or_default();
        left.cmp(right)
    });

    CanonicalReport {
        record_type,
        columns,
        rows: normalized,
    }
}
