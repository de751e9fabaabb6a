//! Parameterized query templates, one per record type.
//!
//! Placeholders: `{y}` reporting year, `{prvy}` previous year, `{org}` the
//! consultation-boundary organization, `{lus}` the quoted unit-name list,
//! `{tm}` the quoted map-label list. Derived report fields (region,
//! new/amended, tenure length) are intentionally not computed here; the
//! deriver stage owns them so every backend returns the same raw columns.

use crate::record_type::RecordType;

/// Landscape units intersecting the consultation boundary.
pub const UNITS: &str = "\
SELECT ldw.LANDSCAPE_UNIT_NAME
FROM WHSE_LAND_USE_PLANNING.RMP_LANDSCAPE_UNIT_SVW ldw
    JOIN WHSE_ADMIN_BOUNDARIES.PIP_CONSULTATION_AREAS_SP pip
        ON SDO_RELATE(ldw.GEOMETRY, pip.SHAPE, 'mask=ANYINTERACT') = 'TRUE'
            AND pip.CONTACT_ORGANIZATION_NAME = q'[{org}]'";

/// Unit overlaps for an explicit set of road map labels.
///
/// Joined against the full unit layer rather than the reference set so units
/// missing from the original resolution are still reported.
pub const ROAD_UNITS: &str = "\
SELECT
    ftr.MAP_LABEL,
    ldm.LANDSCAPE_UNIT_NAME AS LANDSCAPE_UNIT
FROM WHSE_FOREST_TENURE.FTEN_ROAD_SECTION_LINES_SVW ftr
    JOIN (
        SELECT ldu.LANDSCAPE_UNIT_NAME, ldu.GEOMETRY
        FROM WHSE_LAND_USE_PLANNING.RMP_LANDSCAPE_UNIT_SVW ldu
            JOIN WHSE_ADMIN_BOUNDARIES.PIP_CONSULTATION_AREAS_SP pip
                ON SDO_RELATE(ldu.GEOMETRY, pip.SHAPE, 'mask=ANYINTERACT') = 'TRUE'
                    AND pip.CONTACT_ORGANIZATION_NAME = q'[{org}]'
    ) ldm
        ON SDO_RELATE(ftr.GEOMETRY, ldm.GEOMETRY, 'mask=ANYINTERACT') = 'TRUE'
WHERE ftr.MAP_LABEL IN ({tm})";

const TENURE: &str = "\
SELECT
    frr.MAP_LABEL,
    frr.FILE_TYPE_DESCRIPTION,
    frr.FILE_STATUS_CODE,
    frr.FILE_TYPE_CODE,
    frr.LIFE_CYCLE_STATUS_CODE,
    frr.ISSUE_DATE,
    amdd.AMEND_STATUS_DATE AS AMEND_DATE,
    iha.TREATY_SIDE_AGREEMENT_ID AS IHA_ID,
    frr.CURRENT_EXPIRY_DATE_CALC,
    ROUND(SDO_GEOM.SDO_AREA(frr.GEOMETRY, 0.005, 'unit=HECTARE'), 2) AREA_HA,
    frr.ADMIN_DISTRICT_CODE,
    ldu.LANDSCAPE_UNIT_NAME AS LANDSCAPE_UNIT,
    SDO_UTIL.TO_WKTGEOMETRY(frr.GEOMETRY) SHAPE
FROM WHSE_FOREST_TENURE.FTEN_HARVEST_AUTH_POLY_SVW frr
    JOIN WHSE_ADMIN_BOUNDARIES.PIP_CONSULTATION_AREAS_SP pip
        ON SDO_RELATE(frr.GEOMETRY, pip.SHAPE, 'mask=ANYINTERACT') = 'TRUE'
            AND pip.CONTACT_ORGANIZATION_NAME = q'[{org}]'
    LEFT JOIN WHSE_LEGAL_ADMIN_BOUNDARIES.FNT_TREATY_SIDE_AGREEMENTS_SP iha
        ON SDO_RELATE(iha.GEOMETRY, frr.GEOMETRY, 'mask=ANYINTERACT') = 'TRUE'
            AND iha.AREA_TYPE = 'Important Harvest Area'
            AND iha.STATUS = 'ACTIVE'
    JOIN WHSE_LAND_USE_PLANNING.RMP_LANDSCAPE_UNIT_SVW ldu
        ON SDO_RELATE(ldu.GEOMETRY, frr.GEOMETRY, 'mask=ANYINTERACT') = 'TRUE'
            AND ldu.LANDSCAPE_UNIT_NAME IN ({lus})
    LEFT JOIN (
        WITH CTE AS (
            SELECT
                amd.FOREST_FILE_ID || ' ' || amd.CUTTING_PERMIT_ID AS MAP_LABEL,
                amd.AMEND_STATUS_DATE,
                ROW_NUMBER() OVER (
                    PARTITION BY amd.FOREST_FILE_ID, amd.CUTTING_PERMIT_ID
                    ORDER BY amd.AMEND_STATUS_DATE
                ) AS rn
            FROM WHSE_FOREST_TENURE.FTEN_HARVEST_AMEND amd
            WHERE amd.AMEND_STATUS_DATE BETWEEN TO_DATE('01/09/{prvy}', 'DD/MM/YYYY')
                AND TO_DATE('31/08/{y}', 'DD/MM/YYYY')
        )
        SELECT MAP_LABEL, AMEND_STATUS_DATE
        FROM CTE
        WHERE rn = 1
    ) amdd
        ON amdd.MAP_LABEL = frr.MAP_LABEL
WHERE frr.LIFE_CYCLE_STATUS_CODE = 'ACTIVE'
    AND (amdd.AMEND_STATUS_DATE BETWEEN TO_DATE('01/09/{prvy}', 'DD/MM/YYYY')
            AND TO_DATE('31/08/{y}', 'DD/MM/YYYY')
        OR (frr.ISSUE_DATE BETWEEN TO_DATE('01/09/{prvy}', 'DD/MM/YYYY')
            AND TO_DATE('31/08/{y}', 'DD/MM/YYYY')
            AND amdd.AMEND_STATUS_DATE IS NULL))
ORDER BY frr.MAP_LABEL";

const ROAD: &str = "\
SELECT
    ftr.MAP_LABEL,
    ftr.ROAD_SECTION_LENGTH AS ROAD_SECTION_LENGTH_KM,
    ftr.FILE_TYPE_CODE,
    ftr.FILE_TYPE_DESCRIPTION,
    ftr.FILE_STATUS_CODE,
    ftr.LIFE_CYCLE_STATUS_CODE,
    ftr.MAP_LABEL || ', Amendment ' || ftr.AMENDMENT_ID || ', Road Associated: '
        || ftr.ROAD_SECTION_ID AS FILE_AMEND_SECTION,
    rd.ENTRY_TIMESTAMP,
    rd.UPDATE_TIMESTAMP,
    rd.UPDATE_USERID,
    rd.CHANGE_TIMESTAMP4,
    ftr.AWARD_DATE,
    ftr.EXPIRY_DATE,
    iha.TREATY_SIDE_AGREEMENT_ID AS IHA_ID,
    ftr.GEOGRAPHIC_DISTRICT_CODE,
    SDO_UTIL.TO_WKTGEOMETRY(rd.GEOMETRY) SHAPE
FROM (
    SELECT rdd.ENTRY_TIMESTAMP,
        rdd.UPDATE_TIMESTAMP,
        rdd.RETIREMENT_DATE,
        rdd.CHANGE_TIMESTAMP4,
        rdd.UPDATE_USERID,
        rdd.FOREST_FILE_ID || ' ' || rdd.ROAD_SECTION_ID AS MAP_LABEL,
        rdd.GEOMETRY
    FROM WHSE_FOREST_TENURE.FTEN_ROAD_LINES rdd
        JOIN WHSE_ADMIN_BOUNDARIES.PIP_CONSULTATION_AREAS_SP pip
            ON SDO_RELATE(rdd.GEOMETRY, pip.SHAPE, 'mask=ANYINTERACT') = 'TRUE'
                AND pip.CONTACT_ORGANIZATION_NAME = q'[{org}]'
) rd
    JOIN WHSE_FOREST_TENURE.FTEN_ROAD_SECTION_LINES_SVW ftr
        ON ftr.MAP_LABEL = rd.MAP_LABEL
    LEFT JOIN WHSE_LEGAL_ADMIN_BOUNDARIES.FNT_TREATY_SIDE_AGREEMENTS_SP iha
        ON SDO_RELATE(iha.GEOMETRY, ftr.GEOMETRY, 'mask=ANYINTERACT') = 'TRUE'
            AND iha.AREA_TYPE = 'Important Harvest Area'
            AND iha.STATUS = 'ACTIVE'
WHERE ftr.LIFE_CYCLE_STATUS_CODE = 'ACTIVE'
    AND rd.RETIREMENT_DATE IS NULL
    AND (rd.CHANGE_TIMESTAMP4 BETWEEN TO_DATE('01/09/{prvy}', 'DD/MM/YYYY')
            AND TO_DATE('31/08/{y}', 'DD/MM/YYYY')
        OR ftr.AWARD_DATE BETWEEN TO_DATE('01/09/{prvy}', 'DD/MM/YYYY')
            AND TO_DATE('31/08/{y}', 'DD/MM/YYYY'))
ORDER BY ftr.MAP_LABEL";

const PERMIT: &str = "\
SELECT
    supv.MAP_LABEL,
    ROUND(SDO_GEOM.SDO_AREA(supv.GEOMETRY, 0.005, 'unit=HECTARE'), 2) AREA_HA,
    supv.SPECIAL_USE_DESCRIPTION,
    supv.FILE_STATUS_CODE,
    supv.AMENDMENT_ID,
    iha.TREATY_SIDE_AGREEMENT_ID AS IHA_ID,
    supv.LIFE_CYCLE_STATUS_CODE,
    sup.ENTRY_TIMESTAMP,
    sup.UPDATE_TIMESTAMP,
    sup.UPDATE_USERID,
    supv.ADMIN_DISTRICT_CODE,
    ldu.LANDSCAPE_UNIT_NAME AS LANDSCAPE_UNIT,
    SDO_UTIL.TO_WKTGEOMETRY(supv.GEOMETRY) SHAPE
FROM WHSE_FOREST_TENURE.FTEN_SPEC_USE_PERMIT_POLY_SVW supv
    JOIN WHSE_ADMIN_BOUNDARIES.PIP_CONSULTATION_AREAS_SP pip
        ON SDO_RELATE(supv.GEOMETRY, pip.SHAPE, 'mask=ANYINTERACT') = 'TRUE'
            AND pip.CONTACT_ORGANIZATION_NAME = q'[{org}]'
    JOIN WHSE_FOREST_TENURE.FTEN_SPEC_USE_PERMIT sup
        ON sup.FOREST_FILE_ID = supv.MAP_LABEL
    LEFT JOIN WHSE_LEGAL_ADMIN_BOUNDARIES.FNT_TREATY_SIDE_AGREEMENTS_SP iha
        ON SDO_RELATE(iha.GEOMETRY, supv.GEOMETRY, 'mask=ANYINTERACT') = 'TRUE'
            AND iha.AREA_TYPE = 'Important Harvest Area'
            AND iha.STATUS = 'ACTIVE'
    JOIN WHSE_LAND_USE_PLANNING.RMP_LANDSCAPE_UNIT_SVW ldu
        ON SDO_RELATE(ldu.GEOMETRY, supv.GEOMETRY, 'mask=ANYINTERACT') = 'TRUE'
            AND ldu.LANDSCAPE_UNIT_NAME IN ({lus})
WHERE supv.LIFE_CYCLE_STATUS_CODE = 'ACTIVE'
    AND supv.RETIREMENT_DATE IS NULL
    AND sup.ENTRY_TIMESTAMP BETWEEN TO_DATE('01/09/{prvy}', 'DD/MM/YYYY')
        AND TO_DATE('31/08/{y}', 'DD/MM/YYYY')
ORDER BY supv.MAP_LABEL";

const RECREATION_POLY: &str = "\
SELECT
    rcp.MAP_LABEL,
    ROUND(SDO_GEOM.SDO_AREA(rcpv.GEOMETRY, 0.005, 'unit=HECTARE'), 2) AREA_HA,
    rcpv.FILE_STATUS_CODE,
    rcpv.PROJECT_TYPE,
    rcpv.LIFE_CYCLE_STATUS_CODE,
    rcpv.PROJECT_ESTABLISHED_DATE,
    iha.TREATY_SIDE_AGREEMENT_ID AS IHA_ID,
    rcpv.GEOGRAPHIC_DISTRICT_CODE,
    rcp.ENTRY_TIMESTAMP,
    rcp.UPDATE_TIMESTAMP,
    rcp.UPDATE_USERID,
    rcp.CHANGE_TIMESTAMP3,
    ldu.LANDSCAPE_UNIT_NAME AS LANDSCAPE_UNIT,
    SDO_UTIL.TO_WKTGEOMETRY(rcpv.GEOMETRY) SHAPE
FROM (
    SELECT rcpp.FOREST_FILE_ID AS MAP_LABEL,
        rcpp.RETIREMENT_DATE,
        rcpp.UPDATE_USERID,
        rcpp.ENTRY_TIMESTAMP,
        rcpp.UPDATE_TIMESTAMP,
        rcpp.CHANGE_TIMESTAMP3
    FROM WHSE_FOREST_TENURE.FTEN_RECREATION_POLY rcpp
        JOIN WHSE_ADMIN_BOUNDARIES.PIP_CONSULTATION_AREAS_SP pip
            ON SDO_RELATE(rcpp.GEOMETRY, pip.SHAPE, 'mask=ANYINTERACT') = 'TRUE'
                AND pip.CONTACT_ORGANIZATION_NAME = q'[{org}]'
) rcp
    JOIN WHSE_FOREST_TENURE.FTEN_RECREATION_POLY_SVW rcpv
        ON rcp.MAP_LABEL = rcpv.FOREST_FILE_ID
    LEFT JOIN WHSE_LEGAL_ADMIN_BOUNDARIES.FNT_TREATY_SIDE_AGREEMENTS_SP iha
        ON SDO_RELATE(iha.GEOMETRY, rcpv.GEOMETRY, 'mask=ANYINTERACT') = 'TRUE'
            AND iha.AREA_TYPE = 'Important Harvest Area'
            AND iha.STATUS = 'ACTIVE'
    JOIN WHSE_LAND_USE_PLANNING.RMP_LANDSCAPE_UNIT_SVW ldu
        ON SDO_RELATE(ldu.GEOMETRY, rcpv.GEOMETRY, 'mask=ANYINTERACT') = 'TRUE'
            AND ldu.LANDSCAPE_UNIT_NAME IN ({lus})
WHERE rcpv.LIFE_CYCLE_STATUS_CODE = 'ACTIVE'
    AND rcp.RETIREMENT_DATE IS NULL
    AND (rcp.CHANGE_TIMESTAMP3 BETWEEN TO_DATE('01/09/{prvy}', 'DD/MM/YYYY')
            AND TO_DATE('31/08/{y}', 'DD/MM/YYYY')
        OR rcpv.PROJECT_ESTABLISHED_DATE BETWEEN TO_DATE('01/09/{prvy}', 'DD/MM/YYYY')
            AND TO_DATE('31/08/{y}', 'DD/MM/YYYY'))
ORDER BY rcp.MAP_LABEL";

const RECREATION_LINE: &str = "\
SELECT
    rcp.MAP_LABEL,
    rcpv.FEATURE_LENGTH AS LENGTH_KM,
    rcpv.FILE_STATUS_CODE,
    rcpv.PROJECT_TYPE,
    rcpv.LIFE_CYCLE_STATUS_CODE,
    rcpv.PROJECT_ESTABLISHED_DATE,
    iha.TREATY_SIDE_AGREEMENT_ID AS IHA_ID,
    rcpv.DISTRICT_CODE,
    rcp.ENTRY_TIMESTAMP,
    rcp.UPDATE_TIMESTAMP,
    rcp.UPDATE_USERID,
    rcp.CHANGE_TIMESTAMP3,
    ldu.LANDSCAPE_UNIT_NAME AS LANDSCAPE_UNIT,
    SDO_UTIL.TO_WKTGEOMETRY(rcpv.GEOMETRY) SHAPE
FROM (
    SELECT rcpp.FOREST_FILE_ID || ' ' || rcpp.SECTION_ID AS MAP_LABEL,
        rcpp.RETIREMENT_DATE,
        rcpp.UPDATE_USERID,
        rcpp.ENTRY_TIMESTAMP,
        rcpp.UPDATE_TIMESTAMP,
        rcpp.CHANGE_TIMESTAMP3
    FROM WHSE_FOREST_TENURE.FTEN_RECREATION_LINE rcpp
        JOIN WHSE_ADMIN_BOUNDARIES.PIP_CONSULTATION_AREAS_SP pip
            ON SDO_RELATE(rcpp.GEOMETRY, pip.SHAPE, 'mask=ANYINTERACT') = 'TRUE'
                AND pip.CONTACT_ORGANIZATION_NAME = q'[{org}]'
) rcp
    JOIN WHSE_FOREST_TENURE.FTEN_RECREATION_LINES_SVW rcpv
        ON rcp.MAP_LABEL = rcpv.MAP_LABEL
    LEFT JOIN WHSE_LEGAL_ADMIN_BOUNDARIES.FNT_TREATY_SIDE_AGREEMENTS_SP iha
        ON SDO_RELATE(iha.GEOMETRY, rcpv.GEOMETRY, 'mask=ANYINTERACT') = 'TRUE'
            AND iha.AREA_TYPE = 'Important Harvest Area'
            AND iha.STATUS = 'ACTIVE'
    JOIN WHSE_LAND_USE_PLANNING.RMP_LANDSCAPE_UNIT_SVW ldu
        ON SDO_RELATE(ldu.GEOMETRY, rcpv.GEOMETRY, 'mask=ANYINTERACT') = 'TRUE'
            AND ldu.LANDSCAPE_UNIT_NAME IN ({lus})
WHERE rcpv.LIFE_CYCLE_STATUS_CODE = 'ACTIVE'
    AND rcp.RETIREMENT_DATE IS NULL
    AND (rcp.CHANGE_TIMESTAMP3 BETWEEN TO_DATE('01/09/{prvy}', 'DD/MM/YYYY')
            AND TO_DATE('31/08/{y}', 'DD/MM/YYYY')
        OR rcpv.PROJECT_ESTABLISHED_DATE BETWEEN TO_DATE('01/09/{prvy}', 'DD/MM/YYYY')
            AND TO_DATE('31/08/{y}', 'DD/MM/YYYY'))
ORDER BY rcp.MAP_LABEL";

/// The record query template for one record type.
pub fn template_for(record_type: RecordType) -> &'static str {
    match record_type {
        RecordType::TenurePolygon => TENURE,
        RecordType::RoadLine => ROAD,
        RecordType::PermitPolygon => PERMIT,
        RecordType::RecreationPolygon => RECREATION_POLY,
        RecordType::RecreationLine => RECREATION_LINE,
    }
}

/// Quote and join a list of SQL string values: `a, b` → `'a','b'`.
///
/// Embedded single quotes are doubled per SQL literal rules.
pub fn quoted_list<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|value| format!("'{}'", value.as_ref().replace('\'', "''")))
        .collect::<Vec<_>>()
        .join(",")
}

/// Substitute template placeholders.
pub fn render(
    template: &str,
    year: i32,
    org: &str,
    unit_list: &str,
    label_list: &str,
) -> String {
    template
        .replace("{y}", &year.to_string())
        .replace("{prvy}", &(year - 1).to_string())
        .replace("{org}", org)
        .replace("{lus}", unit_list)
        .replace("{tm}", label_list)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_list_escapes_single_quotes() {
        assert_eq!(quoted_list(["a", "b'c"]), "'a','b''c'");
        assert_eq!(quoted_list(Vec::<String>::new()), "");
    }

    #[test]
    fn render_fills_year_placeholders() {
        let sql = render("{prvy}..{y} {org} {lus}", 2024, "Org", "'LU1'", "");
        assert_eq!(sql, "2023..2024 Org 'LU1'");
    }

    #[test]
    fn every_template_orders_by_map_label() {
        for record_type in RecordType::ALL {
            assert!(template_for(record_type).contains("ORDER BY"));
            assert!(template_for(record_type).contains("SHAPE"));
        }
    }
}
