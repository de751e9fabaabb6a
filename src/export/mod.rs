//! Output sinks: per-type GeoJSON files and the multi-sheet workbook.

/// BC Albers → Web Mercator coordinate transform.
pub mod reproject;
/// GeoJSON feature-collection writer.
pub mod spatial;
/// XLSX workbook writer.
pub mod workbook;
