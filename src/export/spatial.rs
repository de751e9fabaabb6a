//! GeoJSON spatial sink: one feature collection per record type.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use geo::Geometry;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, JsonValue};
use serde_json::Number;
use tracing::info;

use crate::config::RunConfig;
use crate::errors::ReportError;
use crate::export::reproject;
use crate::record::{row_label, CellValue};
use crate::schema::CanonicalReport;
use crate::types::MapLabel;

/// EPSG code of the only supported source reference frame (BC Albers).
const SUPPORTED_SOURCE_EPSG: u32 = 3005;

/// Write one GeoJSON file for a canonical report.
///
/// Geometry is rejoined per map label from the fetch-time geometry map and
/// reprojected to Web Mercator. Date cells serialize as plain `YYYY-MM-DD`
/// strings; absent cells serialize as JSON null. Rows without a stored
/// geometry still emit a feature with null geometry.
pub fn write_geojson(
    config: &RunConfig,
    report: &CanonicalReport,
    geometries: &BTreeMap<MapLabel, Geometry<f64>>,
) -> Result<PathBuf, ReportError> {
    if config.source_epsg != SUPPORTED_SOURCE_EPSG {
        return Err(ReportError::SpatialExport(format!(
            "unsupported source EPSG {} (expected {})",
            config.source_epsg, SUPPORTED_SOURCE_EPSG
        )));
    }

    let mut features = Vec::with_capacity(report.rows.len());
    for row in &report.rows {
        let mut properties = JsonObject::new();
        for column in &report.columns {
            let value = row.get(column).cloned().unwrap_or(CellValue::Null);
            properties.insert(column.clone(), to_json(value));
        }
        let geometry = row_label(row)
            .and_then(|label| geometries.get(label))
            .map(reproject::geometry_to_web_mercator)
            .map(|projected| geojson::Geometry::new(geojson::Value::from(&projected)));
        features.push(Feature {
            bbox: None,
            geometry,
            id: None,
            properties: Some(properties),
            foreign_members: None,
        });
    }

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    let path = config.spatial_path(report.record_type.key());
    fs::create_dir_all(&config.out_dir)?;
    fs::write(&path, GeoJson::from(collection).to_string())?;
    info!(
        key = report.record_type.key(),
        features = report.rows.len(),
        path = %path.display(),
        "wrote spatial file"
    );
    Ok(path)
}

fn to_json(value: CellValue) -> JsonValue {
    match value {
        CellValue::Null => JsonValue::Null,
        CellValue::Text(text) => JsonValue::String(text),
        CellValue::Int(int) => JsonValue::Number(Number::from(int)),
        CellValue::Float(float) => Number::from_f64(float)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        CellValue::Date(date) => JsonValue::String(date.format("%Y-%m-%d").to_string()),
    }
}
