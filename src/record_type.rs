//! The closed set of record types and their per-type pipeline rules.
//!
//! Every type-dependent decision in the pipeline (column schema, eligibility
//! date fields, new/amended comparison, deferred unit fetch) is expressed as
//! data returned from this module, so the generic stages dispatch once per
//! record type instead of branching on string tags throughout.

use serde::{Deserialize, Serialize};

/// One of the five structurally distinct authorization/feature categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// Harvest authorization polygons (cutting permits and tenures).
    TenurePolygon,
    /// Road section lines.
    RoadLine,
    /// Special-use permit polygons.
    PermitPolygon,
    /// Recreation project polygons.
    RecreationPolygon,
    /// Recreation project lines (trails).
    RecreationLine,
}

/// Eligibility-window date fields for one record type.
///
/// A row qualifies when `changed` (most recent amendment-like date) falls in
/// the reporting window; when `changed` is absent the `established` date is
/// checked instead. The logical rule is identical across types, only the
/// field names differ.
#[derive(Clone, Copy, Debug)]
pub struct WindowFields {
    /// Amendment/change date column, when the type has one.
    pub changed: Option<&'static str>,
    /// Original issue/award/establishment date column.
    pub established: &'static str,
}

/// Per-type rule deciding the `NEW_AMEND` classification.
#[derive(Clone, Copy, Debug)]
pub enum NewAmendRule {
    /// `Amended` when `amended` exceeds `issued` by more than `grace_days`.
    AmendedAfterGrace {
        /// Amendment date column.
        amended: &'static str,
        /// Issue date column.
        issued: &'static str,
        /// Inclusive grace period in days.
        grace_days: i64,
    },
    /// `New` when `granted` exceeds `changed` by more than `grace_days`
    /// (the comparison direction is inverted relative to `AmendedAfterGrace`).
    NewAfterGrace {
        /// Grant/award date column.
        granted: &'static str,
        /// Change timestamp column.
        changed: &'static str,
        /// Inclusive grace period in days.
        grace_days: i64,
    },
    /// `New` when the amendment counter column equals zero.
    AmendmentCounter {
        /// Counter column.
        counter: &'static str,
    },
    /// `New` when the establishment date is on or after the change date.
    EstablishedOnOrAfterChange {
        /// Establishment date column.
        established: &'static str,
        /// Change timestamp column.
        changed: &'static str,
    },
}

/// Start/end date columns used to compute tenure length in years.
#[derive(Clone, Copy, Debug)]
pub struct TenureDates {
    /// Start (issue/award) date column.
    pub start: &'static str,
    /// End (expiry) date column.
    pub end: &'static str,
}

impl RecordType {
    /// All record types in processing order.
    pub const ALL: [RecordType; 5] = [
        RecordType::TenurePolygon,
        RecordType::RoadLine,
        RecordType::PermitPolygon,
        RecordType::RecreationPolygon,
        RecordType::RecreationLine,
    ];

    /// Stable tag used for sheet names and output file names.
    pub fn key(self) -> &'static str {
        match self {
            RecordType::TenurePolygon => "forest_auth",
            RecordType::RoadLine => "forest_road",
            RecordType::PermitPolygon => "spec_use",
            RecordType::RecreationPolygon => "recr_poly",
            RecordType::RecreationLine => "recr_line",
        }
    }

    /// Canonical output column order for this type.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            RecordType::TenurePolygon | RecordType::PermitPolygon => &[
                "REGION",
                "LANDSCAPE_UNIT",
                "MAP_LABEL",
                "AGENCY",
                "LEGISLATION",
                "FILE_TYPE_DESCRIPTION",
                "FILE_STATUS_CODE",
                "FILE_TYPE_CODE",
                "NEW_AMEND",
                "ISSUE_DATE",
                "TENURE_LENGTH_YRS",
                "AREA_HA",
                "SPATIAL",
                "LAT_LONG",
                "IS_IHA",
                "IHA_ID",
                "DID_ENGAGE_OCCUR",
                "IF_NO_ENGAGE",
                "FN",
                "AMEND_DATE",
            ],
            RecordType::RoadLine => &[
                "REGION",
                "LANDSCAPE_UNIT",
                "MAP_LABEL",
                "FILE_AMEND_SECTION",
                "AGENCY",
                "LEGISLATION",
                "FILE_TYPE_DESCRIPTION",
                "FILE_STATUS_CODE",
                "FILE_TYPE_CODE",
                "NEW_AMEND",
                "ENTRY_TIMESTAMP",
                "TENURE_LENGTH_YRS",
                "ROAD_SECTION_LENGTH_KM",
                "SPATIAL",
                "LAT_LONG",
                "IS_IHA",
                "IHA_ID",
                "DID_ENGAGE_OCCUR",
                "IF_NO_ENGAGE",
                "FN",
                "AMEND_DATE",
            ],
            RecordType::RecreationPolygon => &[
                "REGION",
                "LANDSCAPE_UNIT",
                "MAP_LABEL",
                "AGENCY",
                "LEGISLATION",
                "PROJECT_TYPE",
                "FILE_STATUS_CODE",
                "FILE_TYPE_CODE",
                "NEW_AMEND",
                "ENTRY_TIMESTAMP",
                "TENURE_LENGTH_YRS",
                "AREA_HA",
                "SPATIAL",
                "LAT_LONG",
                "IS_IHA",
                "IHA_ID",
                "DID_ENGAGE_OCCUR",
                "IF_NO_ENGAGE",
                "FN",
                "AMEND_DATE",
            ],
            RecordType::RecreationLine => &[
                "REGION",
                "LANDSCAPE_UNIT",
                "MAP_LABEL",
                "AGENCY",
                "LEGISLATION",
                "PROJECT_TYPE",
                "FILE_STATUS_CODE",
                "FILE_TYPE_CODE",
                "NEW_AMEND",
                "ENTRY_TIMESTAMP",
                "TENURE_LENGTH_YRS",
                "LENGTH_KM",
                "SPATIAL",
                "LAT_LONG",
                "IS_IHA",
                "IHA_ID",
                "DID_ENGAGE_OCCUR",
                "IF_NO_ENGAGE",
                "FN",
                "AMEND_DATE",
            ],
        }
    }

    /// Column renames applied before schema selection (source → canonical).
    pub fn renames(self) -> &'static [(&'static str, &'static str)] {
        match self {
            RecordType::PermitPolygon => &[
                ("SPECIAL_USE_DESCRIPTION", "FILE_TYPE_DESCRIPTION"),
                ("ENTRY_TIMESTAMP", "ISSUE_DATE"),
            ],
            _ => &[],
        }
    }

    /// District-code column used for the region derivation.
    pub fn district_column(self) -> &'static str {
        match self {
            RecordType::TenurePolygon | RecordType::PermitPolygon => "ADMIN_DISTRICT_CODE",
            RecordType::RoadLine | RecordType::RecreationPolygon => "GEOGRAPHIC_DISTRICT_CODE",
            RecordType::RecreationLine => "DISTRICT_CODE",
        }
    }

    /// Eligibility-window field mapping for this type.
    pub fn window_fields(self) -> WindowFields {
        match self {
            RecordType::TenurePolygon => WindowFields {
                changed: Some("AMEND_DATE"),
                established: "ISSUE_DATE",
            },
            RecordType::RoadLine => WindowFields {
                changed: Some("CHANGE_TIMESTAMP4"),
                established: "AWARD_DATE",
            },
            RecordType::PermitPolygon => WindowFields {
                changed: None,
                established: "ENTRY_TIMESTAMP",
            },
            RecordType::RecreationPolygon | RecordType::RecreationLine => WindowFields {
                changed: Some("CHANGE_TIMESTAMP3"),
                established: "PROJECT_ESTABLISHED_DATE",
            },
        }
    }

    /// New-vs-amended classification rule for this type.
    pub fn new_amend_rule(self) -> NewAmendRule {
        match self {
            RecordType::TenurePolygon => NewAmendRule::AmendedAfterGrace {
                amended: "AMEND_DATE",
                issued: "ISSUE_DATE",
                grace_days: 5,
            },
            RecordType::RoadLine => NewAmendRule::NewAfterGrace {
                granted: "AWARD_DATE",
                changed: "CHANGE_TIMESTAMP4",
                grace_days: 5,
            },
            RecordType::PermitPolygon => NewAmendRule::AmendmentCounter {
                counter: "AMENDMENT_ID",
            },
            RecordType::RecreationPolygon | RecordType::RecreationLine => {
                NewAmendRule::EstablishedOnOrAfterChange {
                    established: "PROJECT_ESTABLISHED_DATE",
                    changed: "CHANGE_TIMESTAMP3",
                }
            }
        }
    }

    /// Date pair for tenure-length derivation, when the type has one.
    pub fn tenure_dates(self) -> Option<TenureDates> {
        match self {
            RecordType::TenurePolygon => Some(TenureDates {
                start: "ISSUE_DATE",
                end: "CURRENT_EXPIRY_DATE_CALC",
            }),
            RecordType::RoadLine => Some(TenureDates {
                start: "AWARD_DATE",
                end: "EXPIRY_DATE",
            }),
            _ => None,
        }
    }

    /// Maintenance-user column checked for the data-correction marker.
    pub fn datafix_column(self) -> Option<&'static str> {
        match self {
            RecordType::TenurePolygon => None,
            _ => Some("UPDATE_USERID"),
        }
    }

    /// Whether unit overlap is fetched separately, keyed by map labels.
    ///
    /// Road networks are cheap to fetch once but expensive to join against
    /// the unit layer inline, so the join is deferred to a narrow id-scoped
    /// query.
    pub fn defers_unit_overlap(self) -> bool {
        matches!(self, RecordType::RoadLine)
    }

    /// Whether `FILE_TYPE_CODE` is forced to absent in the output schema.
    pub fn clears_file_type_code(self) -> bool {
        matches!(
            self,
            RecordType::RecreationPolygon | RecordType::RecreationLine
        )
    }
}
