//! Multi-sheet XLSX workbook writer.

use std::collections::BTreeMap;
use std::path::Path;

use rust_xlsxwriter::Workbook;
use tracing::info;

use crate::errors::ReportError;
use crate::record::CellValue;
use crate::record_type::RecordType;
use crate::schema::CanonicalReport;

/// Write every canonical report into one workbook, a sheet per record type.
///
/// Sheets are named by the type's tag and appear in `RecordType` order. Row 0
/// carries the canonical column names; data cells follow with absent values
/// left blank and numbers written numerically.
pub fn write_workbook(
    path: &Path,
    reports: &BTreeMap<RecordType, CanonicalReport>,
) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    for report in reports.values() {
        let sheet = workbook.add_worksheet();
        sheet.set_name(report.record_type.key())?;

        for (col, column) in report.columns.iter().enumerate() {
            sheet.write_string(0, col as u16, column)?;
        }
        for (index, row) in report.rows.iter().enumerate() {
            let sheet_row = (index + 1) as u32;
            for (col, column) in report.columns.iter().enumerate() {
                let sheet_col = col as u16;
                match row.get(column) {
                    None | Some(CellValue::Null) => {}
                    Some(CellValue::Int(value)) => {
                        sheet.write_number(sheet_row, sheet_col, *value as f64)?;
                    }
                    Some(CellValue::Float(value)) => {
                        sheet.write_number(sheet_row, sheet_col, *value)?;
                    }
                    Some(other) => {
                        sheet.write_string(sheet_row, sheet_col, other.render())?;
                    }
                }
            }
        }
    }
    workbook.save(path)?;
    info!(sheets = reports.len(), path = %path.display(), "wrote workbook");
    Ok(())
}
