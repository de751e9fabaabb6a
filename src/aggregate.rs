//! Fold/collapse helpers that undo geometric join fan-out.
//!
//! Every helper is pure and deterministic: values collapse through ordered
//! sets, so the same inputs always produce the same delimited string. Only
//! deduplication and content are contractual; lexicographic order is the
//! implementation's choice of a reproducible order.

use std::collections::{BTreeMap, BTreeSet};

use crate::record::{cell_int, row_label, CellValue, Row};
use crate::types::{MapLabel, OrgName, SecondaryId};

/// Delimiter for unit-name and secondary-id lists.
pub const LIST_SEPARATOR: &str = "; ";
/// Delimiter for organization-name lists.
pub const ORG_SEPARATOR: &str = " & ";

/// Secondary-id column name.
pub const IHA_ID: &str = "IHA_ID";
/// Folded organization column name.
pub const FN_COLUMN: &str = "FN";

/// Sentinel meaning "no secondary overlap" after numeric coercion.
const NO_OVERLAP: SecondaryId = 0;

/// Fold a text column per map label into one deduplicated, sorted,
/// `separator`-joined string.
pub fn fold_text_column(
    rows: &[Row],
    column: &str,
    separator: &str,
) -> BTreeMap<MapLabel, String> {
    let mut grouped: BTreeMap<MapLabel, BTreeSet<String>> = BTreeMap::new();
    for row in rows {
        let Some(label) = row_label(row) else {
            continue;
        };
        if let Some(CellValue::Text(value)) = row.get(column) {
            grouped
                .entry(label.to_string())
                .or_default()
                .insert(value.clone());
        }
    }
    grouped
        .into_iter()
        .map(|(label, values)| {
            let joined = values.into_iter().collect::<Vec<_>>().join(separator);
            (label, joined)
        })
        .collect()
}

/// Fold the secondary-overlap id column per map label.
///
/// Ids coerce to integers; non-numeric and absent values coerce to the `0`
/// sentinel rather than erroring. Distinct ids join ascending with `"; "`.
/// A folded value of exactly `"0"` means the record had no overlap at all
/// and is reported as absent (`None`).
pub fn fold_secondary_ids(rows: &[Row]) -> BTreeMap<MapLabel, Option<String>> {
    let mut grouped: BTreeMap<MapLabel, BTreeSet<SecondaryId>> = BTreeMap::new();
    for row in rows {
        let Some(label) = row_label(row) else {
            continue;
        };
        let id = cell_int(row, IHA_ID).unwrap_or(NO_OVERLAP);
        grouped.entry(label.to_string()).or_default().insert(id);
    }
    grouped
        .into_iter()
        .map(|(label, ids)| {
            let joined = ids
                .iter()
                .map(|id| id.to_string())
                .collect::<Vec<_>>()
                .join(LIST_SEPARATOR);
            let folded = if joined == NO_OVERLAP.to_string() {
                None
            } else {
                Some(joined)
            };
            (label, folded)
        })
        .collect()
}

/// Fold overlay fragments (label, organization) into one `" & "`-joined
/// organization string per label.
pub fn fold_fragments<I>(fragments: I) -> BTreeMap<MapLabel, String>
where
    I: IntoIterator<Item = (MapLabel, OrgName)>,
{
    let mut grouped: BTreeMap<MapLabel, BTreeSet<OrgName>> = BTreeMap::new();
    for (label, org) in fragments {
        grouped.entry(label).or_default().insert(org);
    }
    grouped
        .into_iter()
        .map(|(label, orgs)| {
            let joined = orgs.into_iter().collect::<Vec<_>>().join(ORG_SEPARATOR);
            (label, joined)
        })
        .collect()
}

/// Replace `column` on every row with the folded per-label value.
///
/// Labels missing from `folded` get `Null` (e.g. a record with no overlap).
pub fn merge_folded(rows: &mut [Row], column: &str, folded: &BTreeMap<MapLabel, String>) {
    for row in rows.iter_mut() {
        let value = row_label(row)
            .and_then(|label| folded.get(label))
            .map(|text| CellValue::Text(text.clone()))
            .unwrap_or(CellValue::Null);
        row.insert(column.to_string(), value);
    }
}

/// Replace `column` with an optional folded value (`None` folds to `Null`).
pub fn merge_folded_optional(
    rows: &mut [Row],
    column: &str,
    folded: &BTreeMap<MapLabel, Option<String>>,
) {
    for row in rows.iter_mut() {
        let value = row_label(row)
            .and_then(|label| folded.get(label))
            .and_then(|entry| entry.as_ref())
            .map(|text| CellValue::Text(text.clone()))
            .unwrap_or(CellValue::Null);
        row.insert(column.to_string(), value);
    }
}

/// Keep exactly one row per map label (first occurrence wins).
///
/// Must run after every fold so the surviving row already carries the
/// collapsed values; this is what turns join fan-out back into one report
/// row per authorization.
pub fn dedup_by_label(rows: Vec<Row>) -> Vec<Row> {
    let mut seen: BTreeSet<MapLabel> = BTreeSet::new();
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        match row_label(&row) {
            Some(label) if !seen.insert(label.to_string()) => continue,
            _ => kept.push(row),
        }
    }
    kept
}
