//! Per-record classification fields, computed after folding.

use chrono::{Datelike, Days, NaiveDate};

use crate::record::{cell_date, cell_int, cell_text, CellValue, Row};
use crate::record_type::{NewAmendRule, RecordType};

/// District code mapping to the `South` region.
const SOUTH_DISTRICT: &str = "DSI";
/// Output marker for an unknown tenure length.
const NO_TENURE_LENGTH: &str = "N/A";

/// Region classification from an administrative-district code.
///
/// `DSI` maps to `South`; every other code, including absent, maps to `North`.
pub fn region(district_code: Option<&str>) -> &'static str {
    match district_code {
        Some(code) if code == SOUTH_DISTRICT => "South",
        _ => "North",
    }
}

/// New-vs-amended classification for one row under a type's rule.
pub fn new_or_amended(rule: NewAmendRule, row: &Row) -> &'static str {
    match rule {
        NewAmendRule::AmendedAfterGrace {
            amended,
            issued,
            grace_days,
        } => {
            let is_amended = match (cell_date(row, amended), cell_date(row, issued)) {
                (Some(amend), Some(issue)) => exceeds_grace(amend, issue, grace_days),
                _ => false,
            };
            if is_amended {
                "Amended"
            } else {
                "New"
            }
        }
        NewAmendRule::NewAfterGrace {
            granted,
            changed,
            grace_days,
        } => {
            let is_new = match (cell_date(row, granted), cell_date(row, changed)) {
                (Some(grant), Some(change)) => exceeds_grace(grant, change, grace_days),
                _ => false,
            };
            if is_new {
                "New"
            } else {
                "Amended"
            }
        }
        NewAmendRule::AmendmentCounter { counter } => {
            if cell_int(row, counter) == Some(0) {
                "New"
            } else {
                "Amended"
            }
        }
        NewAmendRule::EstablishedOnOrAfterChange {
            established,
            changed,
        } => {
            let is_new = match (cell_date(row, established), cell_date(row, changed)) {
                (Some(establish), Some(change)) => establish >= change,
                _ => false,
            };
            if is_new {
                "New"
            } else {
                "Amended"
            }
        }
    }
}

/// Whether `later` exceeds `base` by strictly more than `grace_days` days.
/// The boundary day itself is inside the grace period.
fn exceeds_grace(later: NaiveDate, base: NaiveDate, grace_days: i64) -> bool {
    match base.checked_add_days(Days::new(grace_days.max(0) as u64)) {
        Some(limit) => later > limit,
        None => false,
    }
}

/// Tenure length in whole years, normalized for the report template.
///
/// - both dates present: calendar-year difference, with `0` promoted to `"1"`
///   (a same-year grant counts as one year),
/// - anything missing: the literal `"N/A"`.
pub fn tenure_length(start: Option<NaiveDate>, end: Option<NaiveDate>) -> String {
    match (start, end) {
        (Some(start), Some(end)) => {
            let years = i64::from(end.year()) - i64::from(start.year());
            let years = if years == 0 { 1 } else { years };
            years.to_string()
        }
        _ => NO_TENURE_LENGTH.to_string(),
    }
}

/// Apply every derived and fixed field to a folded row.
///
/// Expects folding to have already collapsed `IHA_ID`, `LANDSCAPE_UNIT`, and
/// `FN`; reads the type's raw date/code columns and writes the derived report
/// columns in place.
pub fn apply(record_type: RecordType, row: &mut Row) {
    let region_value = region(cell_text(row, record_type.district_column()));
    row.insert("REGION".to_string(), region_value.into());

    let new_amend = new_or_amended(record_type.new_amend_rule(), row);
    row.insert("NEW_AMEND".to_string(), new_amend.into());

    let length = match record_type.tenure_dates() {
        Some(dates) => tenure_length(cell_date(row, dates.start), cell_date(row, dates.end)),
        None => NO_TENURE_LENGTH.to_string(),
    };
    row.insert("TENURE_LENGTH_YRS".to_string(), length.into());

    row.insert("AGENCY".to_string(), "FOR".into());
    row.insert("LEGISLATION".to_string(), "Forest Act and FRPA".into());
    row.insert("SPATIAL".to_string(), "Yes".into());
    row.insert("LAT_LONG".to_string(), CellValue::Null);
    // Manual post-processing placeholders: engagement is recorded by hand
    // after the report is generated.
    row.insert("DID_ENGAGE_OCCUR".to_string(), "Enter Yes or No".into());
    row.insert("IF_NO_ENGAGE".to_string(), CellValue::Null);
    row.insert("AMEND_DATE".to_string(), CellValue::Null);

    let is_iha = row
        .get("IHA_ID")
        .map(|value| !value.is_null())
        .unwrap_or(false);
    row.insert(
        "IS_IHA".to_string(),
        if is_iha { "YES".into() } else { "NO".into() },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn row(pairs: &[(&str, CellValue)]) -> Row {
        let mut row = Row::new();
        for (column, value) in pairs {
            row.insert(column.to_string(), value.clone());
        }
        row
    }

    #[test]
    fn region_maps_dsi_to_south_and_everything_else_to_north() {
        assert_eq!(region(Some("DSI")), "South");
        assert_eq!(region(Some("DNI")), "North");
        assert_eq!(region(None), "North");
    }

    #[test]
    fn amendment_grace_boundary_is_inclusive() {
        let rule = RecordType::TenurePolygon.new_amend_rule();
        let issued = date(2024, 1, 10);

        let at_boundary = row(&[
            ("ISSUE_DATE", issued.into()),
            ("AMEND_DATE", date(2024, 1, 15).into()),
        ]);
        assert_eq!(new_or_amended(rule, &at_boundary), "New");

        let past_boundary = row(&[
            ("ISSUE_DATE", issued.into()),
            ("AMEND_DATE", date(2024, 1, 16).into()),
        ]);
        assert_eq!(new_or_amended(rule, &past_boundary), "Amended");
    }

    #[test]
    fn road_rule_inverts_the_comparison() {
        let rule = RecordType::RoadLine.new_amend_rule();
        let changed = date(2024, 1, 10);

        let awarded_later = row(&[
            ("CHANGE_TIMESTAMP4", changed.into()),
            ("AWARD_DATE", date(2024, 1, 20).into()),
        ]);
        assert_eq!(new_or_amended(rule, &awarded_later), "New");

        let awarded_within_grace = row(&[
            ("CHANGE_TIMESTAMP4", changed.into()),
            ("AWARD_DATE", date(2024, 1, 12).into()),
        ]);
        assert_eq!(new_or_amended(rule, &awarded_within_grace), "Amended");
    }

    #[test]
    fn amendment_counter_zero_means_new() {
        let rule = RecordType::PermitPolygon.new_amend_rule();
        assert_eq!(
            new_or_amended(rule, &row(&[("AMENDMENT_ID", CellValue::Int(0))])),
            "New"
        );
        assert_eq!(
            new_or_amended(rule, &row(&[("AMENDMENT_ID", CellValue::Int(3))])),
            "Amended"
        );
    }

    #[test]
    fn establishment_on_or_after_change_means_new() {
        let rule = RecordType::RecreationPolygon.new_amend_rule();
        let same_day = row(&[
            ("PROJECT_ESTABLISHED_DATE", date(2024, 2, 1).into()),
            ("CHANGE_TIMESTAMP3", date(2024, 2, 1).into()),
        ]);
        assert_eq!(new_or_amended(rule, &same_day), "New");

        let changed_later = row(&[
            ("PROJECT_ESTABLISHED_DATE", date(2024, 2, 1).into()),
            ("CHANGE_TIMESTAMP3", date(2024, 3, 1).into()),
        ]);
        assert_eq!(new_or_amended(rule, &changed_later), "Amended");
    }

    #[test]
    fn tenure_length_normalizes_zero_and_absent() {
        assert_eq!(
            tenure_length(Some(date(2024, 1, 1)), Some(date(2024, 12, 1))),
            "1"
        );
        assert_eq!(
            tenure_length(Some(date(2017, 5, 1)), Some(date(2024, 5, 1))),
            "7"
        );
        assert_eq!(tenure_length(Some(date(2024, 1, 1)), None), "N/A");
        assert_eq!(tenure_length(None, None), "N/A");
    }

    #[test]
    fn apply_sets_important_area_flag_from_folded_ids() {
        let mut with_overlap = row(&[
            ("MAP_LABEL", "A1".into()),
            ("IHA_ID", "42".into()),
            ("ADMIN_DISTRICT_CODE", "DSI".into()),
        ]);
        apply(RecordType::TenurePolygon, &mut with_overlap);
        assert_eq!(with_overlap.get("IS_IHA"), Some(&CellValue::Text("YES".into())));
        assert_eq!(with_overlap.get("REGION"), Some(&CellValue::Text("South".into())));

        let mut without_overlap = row(&[("MAP_LABEL", "A2".into()), ("IHA_ID", CellValue::Null)]);
        apply(RecordType::TenurePolygon, &mut without_overlap);
        assert_eq!(
            without_overlap.get("IS_IHA"),
            Some(&CellValue::Text("NO".into()))
        );
        assert_eq!(
            without_overlap.get("TENURE_LENGTH_YRS"),
            Some(&CellValue::Text("N/A".into()))
        );
    }
}
