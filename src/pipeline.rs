//! Per-run orchestration: fetch, overlay, fold, derive, normalize, export.
//!
//! Ownership model:
//! - `run` owns the whole batch; each record type is processed independently
//!   and only the immutable reference-unit set crosses type boundaries.
//! - Canonical reports are staged in a `BTreeMap` so the workbook sheets come
//!   out in declaration order on every run.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::aggregate::{
    dedup_by_label, fold_fragments, fold_secondary_ids, fold_text_column, merge_folded,
    merge_folded_optional, FN_COLUMN, IHA_ID, LIST_SEPARATOR,
};
use crate::config::RunConfig;
use crate::derive;
use crate::errors::ReportError;
use crate::export::{spatial, workbook};
use crate::overlay::{intersect, OrgLayer, OverlayFragment};
use crate::record_type::RecordType;
use crate::schema::{normalize, CanonicalReport};
use crate::source::{QueryExecutor, RecordSource, UNIT_COLUMN};

/// Outcome of one reporting run.
#[derive(Clone, Debug)]
pub struct RunSummary {
    /// Reporting year the run covered.
    pub year: i32,
    /// Canonical row count per exported record type. Types that fetched no
    /// rows, or whose boundary layer failed to load, are absent.
    pub reports: BTreeMap<RecordType, usize>,
    /// Path of the workbook written for the run.
    pub workbook_path: PathBuf,
}

/// Execute a full reporting run.
///
/// Fetches every record type in declaration order, reconciles join fan-out
/// into one row per map label, computes the organization overlay, and writes
/// one GeoJSON file per type plus a single multi-sheet workbook. Executor
/// failures abort the run; an empty fetch or an unreadable boundary layer
/// only skips the affected type.
pub fn run<E: QueryExecutor>(
    config: &RunConfig,
    executor: &E,
) -> Result<RunSummary, ReportError> {
    info!(year = config.year, "starting reporting run");
    let source = RecordSource::new(executor, config);
    let unit_set = source.resolve_units()?;

    let mut reports: BTreeMap<RecordType, CanonicalReport> = BTreeMap::new();
    for record_type in RecordType::ALL {
        let set = source.fetch(record_type, &unit_set)?;
        if set.is_empty() {
            info!(key = record_type.key(), "no records in window; skipping");
            continue;
        }

        let layer = match OrgLayer::from_geojson_path(&config.org_layer) {
            Ok(layer) => layer,
            Err(err) => {
                warn!(
                    key = record_type.key(),
                    error = %err,
                    "boundary layer unavailable; skipping record type"
                );
                continue;
            }
        };
        let fragments = intersect(&set, &layer);

        let unit_overlaps = if record_type.defers_unit_overlap() {
            source.resolve_units_for(&set.labels())?
        } else {
            fold_text_column(&set.rows, UNIT_COLUMN, LIST_SEPARATOR)
        };
        let ids = fold_secondary_ids(&set.rows);

        let mut rows = set.rows;

        merge_folded(&mut rows, UNIT_COLUMN, &unit_overlaps);
        merge_folded_optional(&mut rows, IHA_ID, &ids);

        let mut rows = dedup_by_label(rows);
        merge_folded(&mut rows, FN_COLUMN, &fold_overlaps(fragments));

        for row in &mut rows {
            derive::apply(record_type, row);
        }
        let report = normalize(record_type, rows);
        spatial::write_geojson(config, &report, &set.geometries)?;
        reports.insert(record_type, report);
    }

    let workbook_path = config.workbook_path();
    workbook::write_workbook(&workbook_path, &reports)?;

    let summary = RunSummary {
        year: config.year,
        reports: reports
            .iter()
            .map(|(record_type, report)| (*record_type, report.rows.len()))
            .collect(),
        workbook_path,
    };
    info!(types = summary.reports.len(), "reporting run complete");
    Ok(summary)
}

fn fold_overlaps(fragments: Vec<OverlayFragment>) -> BTreeMap<String, String> {
    fold_fragments(
        fragments
            .into_iter()
            .map(|fragment| (fragment.map_label, fragment.org_name)),
    )
}
