//! Per-organization boundary layer and the geometric overlap step.
//!
//! This is the only stage performing true geometric computation; everything
//! upstream is relational predicate evaluation. One `OverlayFragment` is
//! produced per (record, overlapping organization polygon) pair and consumed
//! by the aggregation step immediately afterwards.

use std::fs;
use std::path::Path;

use geo::{Area, BooleanOps, Geometry, LineString, MultiLineString, MultiPolygon, Polygon};
use geojson::GeoJson;
use tracing::{debug, warn};

use crate::errors::ReportError;
use crate::record::RecordSet;
use crate::types::{MapLabel, OrgName};

/// Property carrying the organization name on layer features.
const NAME_PROPERTY: &str = "FN_area_r";

/// One record/organization overlap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OverlayFragment {
    /// Originating record key.
    pub map_label: MapLabel,
    /// Organization whose polygon overlaps the record.
    pub org_name: OrgName,
}

/// A named organization polygon from the boundary layer.
#[derive(Clone, Debug)]
pub struct OrgPolygon {
    /// Organization name attribute.
    pub name: OrgName,
    /// Polygon footprint.
    pub footprint: MultiPolygon<f64>,
}

/// The per-organization sub-boundary layer.
#[derive(Clone, Debug, Default)]
pub struct OrgLayer {
    polygons: Vec<OrgPolygon>,
}

impl OrgLayer {
    /// Build a layer from prebuilt (name, footprint) parts.
    pub fn from_parts(parts: Vec<(OrgName, MultiPolygon<f64>)>) -> Self {
        Self {
            polygons: parts
                .into_iter()
                .map(|(name, footprint)| OrgPolygon { name, footprint })
                .collect(),
        }
    }

    /// Load the layer from a GeoJSON file.
    ///
    /// Only `.geojson`/`.json` inputs are recognized; anything else fails the
    /// overlay step that requested the load. Features without a polygonal
    /// geometry or the name property are skipped with a warning.
    pub fn from_geojson_path(path: &Path) -> Result<Self, ReportError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        if !matches!(extension.as_deref(), Some("geojson") | Some("json")) {
            return Err(ReportError::UnrecognizedLayerFormat {
                path: path.to_path_buf(),
            });
        }

        let body = fs::read_to_string(path).map_err(|err| ReportError::LayerRead {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        let geojson: GeoJson = body.parse().map_err(|err: geojson::Error| {
            ReportError::LayerRead {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }
        })?;
        let GeoJson::FeatureCollection(collection) = geojson else {
            return Err(ReportError::LayerRead {
                path: path.to_path_buf(),
                reason: "expected a FeatureCollection".to_string(),
            });
        };

        let mut polygons = Vec::new();
        for feature in collection.features {
            let name = feature
                .properties
                .as_ref()
                .and_then(|props| props.get(NAME_PROPERTY))
                .and_then(|value| value.as_str())
                .map(str::to_string);
            let geometry = feature
                .geometry
                .as_ref()
                .and_then(|geometry| Geometry::<f64>::try_from(geometry.value.clone()).ok());
            match (name, geometry.and_then(polygonal)) {
                (Some(name), Some(footprint)) => polygons.push(OrgPolygon { name, footprint }),
                _ => warn!("skipping layer feature without name or polygon geometry"),
            }
        }
        Ok(Self { polygons })
    }

    /// Number of organization polygons in the layer.
    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    /// Whether the layer carries no polygons.
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

/// Compute the true geometric intersection between every record geometry and
/// every organization polygon.
///
/// A record with zero overlaps contributes zero fragments; the aggregation
/// step reports it as "no organization".
pub fn intersect(record_set: &RecordSet, layer: &OrgLayer) -> Vec<OverlayFragment> {
    let mut fragments = Vec::new();
    for (label, geometry) in &record_set.geometries {
        match classify(geometry) {
            Some(Footprint::Polygonal(record)) => {
                for org in &layer.polygons {
                    let overlap = org.footprint.intersection(&record);
                    if overlap.unsigned_area() > 0.0 {
                        fragments.push(OverlayFragment {
                            map_label: label.clone(),
                            org_name: org.name.clone(),
                        });
                    }
                }
            }
            Some(Footprint::Linear(record)) => {
                for org in &layer.polygons {
                    let clipped = org.footprint.clip(&record, false);
                    if clipped.0.iter().any(|line| line.0.len() >= 2) {
                        fragments.push(OverlayFragment {
                            map_label: label.clone(),
                            org_name: org.name.clone(),
                        });
                    }
                }
            }
            None => warn!(label = label.as_str(), "record geometry is not overlayable"),
        }
    }
    debug!(
        key = record_set.record_type.key(),
        fragments = fragments.len(),
        "computed organization overlaps"
    );
    fragments
}

enum Footprint {
    Polygonal(MultiPolygon<f64>),
    Linear(MultiLineString<f64>),
}

fn classify(geometry: &Geometry<f64>) -> Option<Footprint> {
    match geometry {
        Geometry::Polygon(polygon) => {
            Some(Footprint::Polygonal(MultiPolygon(vec![polygon.clone()])))
        }
        Geometry::MultiPolygon(multi) => Some(Footprint::Polygonal(multi.clone())),
        Geometry::LineString(line) => {
            Some(Footprint::Linear(MultiLineString(vec![line.clone()])))
        }
        Geometry::MultiLineString(multi) => Some(Footprint::Linear(multi.clone())),
        _ => None,
    }
}

fn polygonal(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(polygon) => Some(MultiPolygon(vec![polygon])),
        Geometry::MultiPolygon(multi) => Some(multi),
        _ => None,
    }
}

/// Axis-aligned rectangle helper used by tests and fixtures.
pub fn rectangle(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Polygon<f64> {
    Polygon::new(
        LineString::from(vec![
            (min_x, min_y),
            (max_x, min_y),
            (max_x, max_y),
            (min_x, max_y),
            (min_x, min_y),
        ]),
        vec![],
    )
}
