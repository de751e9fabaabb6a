//! Record source interfaces and the per-type fetch logic.
//!
//! Ownership model:
//! - `QueryExecutor` is the external-collaborator seam: it receives a rendered
//!   query plus bound parameters and returns named-column rows.
//! - `RecordSource` owns everything on this side of that seam: template
//!   rendering, row-level eligibility, geometry extraction, and the deferred
//!   road unit-overlap fetch.

use std::collections::{BTreeMap, BTreeSet};

use geo::Geometry;
use tracing::{debug, info};
use wkt::TryFromWkt;

use crate::config::RunConfig;
use crate::errors::ReportError;
use crate::record::{cell_date, cell_text, row_label, RecordSet, Row, SHAPE};
use crate::record_type::RecordType;
use crate::types::{MapLabel, UnitName};

/// Query template definitions and the placeholder renderer.
pub mod queries;

/// Column returned by the unit-resolution query.
pub const UNIT_NAME_COLUMN: &str = "LANDSCAPE_UNIT_NAME";
/// Folded unit-overlap column carried on record rows.
pub const UNIT_COLUMN: &str = "LANDSCAPE_UNIT";

/// Case-insensitive marker excluding data-correction maintenance rows.
const DATAFIX_MARKER: &str = "datafix";

/// Which logical query a request represents.
///
/// Lets non-SQL executors (tests, fixtures) dispatch without parsing SQL.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum QueryKind {
    /// Reference unit resolution.
    Units,
    /// Per-type record fetch.
    Records(RecordType),
    /// Deferred road unit-overlap fetch.
    RoadUnits,
}

/// Bound parameters accompanying a rendered query.
#[derive(Clone, Debug, Default)]
pub struct QueryParams {
    /// Reporting year.
    pub year: i32,
    /// Previous year (window start year).
    pub prev_year: i32,
    /// Consultation-boundary organization filter.
    pub org: String,
    /// Reference unit names constraining the query, when applicable.
    pub unit_names: Vec<UnitName>,
    /// Map labels scoping the query, when applicable.
    pub map_labels: Vec<MapLabel>,
}

/// A fully rendered query plus its bound parameters.
#[derive(Clone, Debug)]
pub struct QueryRequest {
    /// Logical query identity.
    pub kind: QueryKind,
    /// Rendered query text.
    pub sql: String,
    /// Bound parameters (also substituted into `sql`).
    pub params: QueryParams,
}

/// External collaborator executing queries against the record store.
///
/// A failed execution is fatal to the run; an empty row set is not.
pub trait QueryExecutor {
    /// Execute `request` and return named-column rows.
    fn execute(&self, request: &QueryRequest) -> Result<Vec<Row>, ReportError>;
}

/// Fetches and pre-filters records for each record type.
pub struct RecordSource<'a, E: QueryExecutor> {
    executor: &'a E,
    config: &'a RunConfig,
}

impl<'a, E: QueryExecutor> RecordSource<'a, E> {
    /// Create a source bound to an executor and run configuration.
    pub fn new(executor: &'a E, config: &'a RunConfig) -> Self {
        Self { executor, config }
    }

    /// Resolve the set of unit names intersecting the consultation boundary.
    ///
    /// Computed once per run; an empty set is a valid outcome and simply
    /// yields empty per-type fetches downstream.
    pub fn resolve_units(&self) -> Result<BTreeSet<UnitName>, ReportError> {
        let request = self.request(QueryKind::Units, queries::UNITS, &[], &[]);
        let rows = self.executor.execute(&request)?;
        let units: BTreeSet<UnitName> = rows
            .iter()
            .filter_map(|row| cell_text(row, UNIT_NAME_COLUMN))
            .map(str::to_string)
            .collect();
        info!(units = units.len(), "resolved reference units");
        Ok(units)
    }

    /// Fetch the reporting-window records for one record type.
    pub fn fetch(
        &self,
        record_type: RecordType,
        unit_set: &BTreeSet<UnitName>,
    ) -> Result<RecordSet, ReportError> {
        let units: Vec<UnitName> = unit_set.iter().cloned().collect();
        let request = self.request(
            QueryKind::Records(record_type),
            queries::template_for(record_type),
            &units,
            &[],
        );
        debug!(key = record_type.key(), "executing record query");
        let raw_rows = self.executor.execute(&request)?;

        let mut set = RecordSet::empty(record_type);
        for mut row in raw_rows {
            if is_datafix_row(&row, record_type) || !is_in_window(&row, record_type, self.config) {
                continue;
            }
            if let Some(shape) = row.shift_remove(SHAPE) {
                if let Some(wkt_text) = shape.as_text() {
                    let label = row_label(&row).unwrap_or_default().to_string();
                    if !set.geometries.contains_key(&label) {
                        let geometry = parse_wkt(&label, wkt_text)?;
                        set.geometries.insert(label, geometry);
                    }
                }
            }
            set.rows.push(row);
        }
        info!(
            key = record_type.key(),
            rows = set.rows.len(),
            features = set.geometries.len(),
            "fetched record set"
        );
        Ok(set)
    }

    /// Resolve unit overlaps for an explicit set of road map labels.
    ///
    /// Scoped to the labels already fetched and joined against the full unit
    /// layer; returns one folded, `"; "`-delimited unit string per label.
    pub fn resolve_units_for(
        &self,
        map_labels: &[MapLabel],
    ) -> Result<BTreeMap<MapLabel, String>, ReportError> {
        if map_labels.is_empty() {
            return Ok(BTreeMap::new());
        }
        let request = self.request(QueryKind::RoadUnits, queries::ROAD_UNITS, &[], map_labels);
        let rows = self.executor.execute(&request)?;

        let mut grouped: BTreeMap<MapLabel, BTreeSet<UnitName>> = BTreeMap::new();
        for row in &rows {
            let (Some(label), Some(unit)) = (row_label(row), cell_text(row, UNIT_COLUMN)) else {
                continue;
            };
            grouped
                .entry(label.to_string())
                .or_default()
                .insert(unit.to_string());
        }
        Ok(grouped
            .into_iter()
            .map(|(label, units)| {
                let folded = units.into_iter().collect::<Vec<_>>().join("; ");
                (label, folded)
            })
            .collect())
    }

    fn request(
        &self,
        kind: QueryKind,
        template: &str,
        unit_names: &[UnitName],
        map_labels: &[MapLabel],
    ) -> QueryRequest {
        let sql = queries::render(
            template,
            self.config.year,
            &self.config.boundary_org,
            &queries::quoted_list(unit_names),
            &queries::quoted_list(map_labels),
        );
        QueryRequest {
            kind,
            sql,
            params: QueryParams {
                year: self.config.year,
                prev_year: self.config.year - 1,
                org: self.config.boundary_org.clone(),
                unit_names: unit_names.to_vec(),
                map_labels: map_labels.to_vec(),
            },
        }
    }
}

/// Whether the row's maintenance user id carries the data-correction marker.
fn is_datafix_row(row: &Row, record_type: RecordType) -> bool {
    let Some(column) = record_type.datafix_column() else {
        return false;
    };
    cell_text(row, column)
        .map(|user| user.to_ascii_lowercase().contains(DATAFIX_MARKER))
        .unwrap_or(false)
}

/// Row-level reporting-window eligibility.
///
/// The amendment-like date takes precedence when present; otherwise the
/// establishment date decides. Rows with neither date are ineligible.
fn is_in_window(row: &Row, record_type: RecordType, config: &RunConfig) -> bool {
    let window = config.window();
    let fields = record_type.window_fields();
    let changed = fields.changed.and_then(|column| cell_date(row, column));
    match changed {
        Some(date) => window.contains(date),
        None => cell_date(row, fields.established)
            .map(|date| window.contains(date))
            .unwrap_or(false),
    }
}

fn parse_wkt(label: &str, wkt_text: &str) -> Result<Geometry<f64>, ReportError> {
    Geometry::try_from_wkt_str(wkt_text).map_err(|err| ReportError::Geometry {
        label: label.to_string(),
        reason: err.to_string(),
    })
}

/// In-memory executor for tests and fixtures.
///
/// Responses are keyed by `QueryKind`; missing keys return empty row sets,
/// mirroring a backend with no matching records.
#[derive(Default)]
pub struct InMemoryExecutor {
    responses: BTreeMap<QueryKind, Vec<Row>>,
}

impl InMemoryExecutor {
    /// Register unit-resolution rows from plain unit names.
    pub fn with_units<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = names
            .into_iter()
            .map(|name| {
                let mut row = Row::new();
                row.insert(UNIT_NAME_COLUMN.to_string(), name.into().into());
                row
            })
            .collect();
        self.responses.insert(QueryKind::Units, rows);
        self
    }

    /// Register record rows for one record type.
    pub fn with_records(mut self, record_type: RecordType, rows: Vec<Row>) -> Self {
        self.responses.insert(QueryKind::Records(record_type), rows);
        self
    }

    /// Register deferred road unit-overlap rows.
    pub fn with_road_units(mut self, rows: Vec<Row>) -> Self {
        self.responses.insert(QueryKind::RoadUnits, rows);
        self
    }
}

impl QueryExecutor for InMemoryExecutor {
    fn execute(&self, request: &QueryRequest) -> Result<Vec<Row>, ReportError> {
        Ok(self.responses.get(&request.kind).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn config() -> RunConfig {
        RunConfig::new(2024, "/tmp/out")
    }

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn tenure_row(label: &str, issued: NaiveDate, wkt: &str) -> Row {
        let mut row = Row::new();
        row.insert("MAP_LABEL".to_string(), label.into());
        row.insert("ISSUE_DATE".to_string(), issued.into());
        row.insert(SHAPE.to_string(), wkt.into());
        row
    }

    const UNIT_SQUARE: &str = "POLYGON((0 0,1 0,1 1,0 1,0 0))";

    #[test]
    fn fetch_strips_shape_and_parses_geometry() {
        let executor = InMemoryExecutor::default().with_records(
            RecordType::TenurePolygon,
            vec![tenure_row("A1", date(2024, 3, 1), UNIT_SQUARE)],
        );
        let config = config();
        let source = RecordSource::new(&executor, &config);
        let set = source
            .fetch(RecordType::TenurePolygon, &BTreeSet::new())
            .expect("fetch should succeed");
        assert_eq!(set.rows.len(), 1);
        assert!(!set.rows[0].contains_key(SHAPE));
        assert!(set.geometries.contains_key("A1"));
    }

    #[test]
    fn fetch_rejects_unparseable_geometry() {
        let executor = InMemoryExecutor::default().with_records(
            RecordType::TenurePolygon,
            vec![tenure_row("A1", date(2024, 3, 1), "POLYGON((broken")],
        );
        let config = config();
        let source = RecordSource::new(&executor, &config);
        let err = source
            .fetch(RecordType::TenurePolygon, &BTreeSet::new())
            .expect_err("broken wkt should fail");
        assert!(matches!(err, ReportError::Geometry { .. }));
    }

    #[test]
    fn window_rule_prefers_amendment_date() {
        let config = config();
        // Amendment outside the window excludes the row even when the issue
        // date is inside it.
        let mut row = tenure_row("A1", date(2024, 3, 1), UNIT_SQUARE);
        row.insert("AMEND_DATE".to_string(), date(2020, 1, 1).into());
        assert!(!is_in_window(&row, RecordType::TenurePolygon, &config));

        // No amendment: the issue date decides.
        let row = tenure_row("A2", date(2024, 3, 1), UNIT_SQUARE);
        assert!(is_in_window(&row, RecordType::TenurePolygon, &config));

        let row = tenure_row("A3", date(2019, 3, 1), UNIT_SQUARE);
        assert!(!is_in_window(&row, RecordType::TenurePolygon, &config));
    }

    #[test]
    fn datafix_rows_are_excluded_case_insensitively() {
        let mut row = Row::new();
        row.insert("MAP_LABEL".to_string(), "R1".into());
        row.insert("UPDATE_USERID".to_string(), "BATCH_DataFix_7".into());
        assert!(is_datafix_row(&row, RecordType::RoadLine));
        assert!(!is_datafix_row(&row, RecordType::TenurePolygon));
    }

    #[test]
    fn road_unit_overlaps_fold_per_label() {
        let mut row_a = Row::new();
        row_a.insert("MAP_LABEL".to_string(), "R1".into());
        row_a.insert(UNIT_COLUMN.to_string(), "LU2".into());
        let mut row_b = Row::new();
        row_b.insert("MAP_LABEL".to_string(), "R1".into());
        row_b.insert(UNIT_COLUMN.to_string(), "LU1".into());
        let mut row_c = row_a.clone();
        row_c.insert(UNIT_COLUMN.to_string(), "LU2".into());

        let executor = InMemoryExecutor::default().with_road_units(vec![row_a, row_b, row_c]);
        let config = config();
        let source = RecordSource::new(&executor, &config);
        let folded = source
            .resolve_units_for(&["R1".to_string()])
            .expect("road unit fetch should succeed");
        assert_eq!(folded.get("R1").map(String::as_str), Some("LU1; LU2"));
    }

    #[test]
    fn resolve_units_for_short_circuits_on_no_labels() {
        let executor = InMemoryExecutor::default();
        let config = config();
        let source = RecordSource::new(&executor, &config);
        assert!(source.resolve_units_for(&[]).expect("empty ok").is_empty());
    }
}
