use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use frpa_reporting::record::Row;
use frpa_reporting::source::InMemoryExecutor;
use frpa_reporting::{run, CellValue, RecordType, RunConfig};
use geojson::GeoJson;
use serde_json::Value;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Two-organization boundary layer: Org A covers x in [0, 6], Org B x in
/// [6, 10], both y in [0, 10].
fn write_org_layer(dir: &Path) -> PathBuf {
    let path = dir.join("boundary.geojson");
    let body = r#"{
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "properties": { "FN_area_r": "Org A" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0,0],[6,0],[6,10],[0,10],[0,0]]]
                }
            },
            {
                "type": "Feature",
                "properties": { "FN_area_r": "Org B" },
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[6,0],[10,0],[10,10],[6,10],[6,0]]]
                }
            }
        ]
    }"#;
    fs::write(&path, body).expect("failed writing boundary layer");
    path
}

fn tenure_row(label: &str, unit: &str, iha: Option<i64>, wkt: &str) -> Row {
    let mut row = Row::new();
    row.insert("MAP_LABEL".to_string(), label.into());
    row.insert("LANDSCAPE_UNIT".to_string(), unit.into());
    row.insert(
        "IHA_ID".to_string(),
        match iha {
            Some(id) => CellValue::Int(id),
            None => CellValue::Null,
        },
    );
    row.insert("ISSUE_DATE".to_string(), date(2024, 3, 1).into());
    row.insert(
        "CURRENT_EXPIRY_DATE_CALC".to_string(),
        date(2031, 3, 1).into(),
    );
    row.insert("ADMIN_DISTRICT_CODE".to_string(), "DSI".into());
    row.insert("FILE_STATUS_CODE".to_string(), "HI".into());
    row.insert("SHAPE".to_string(), wkt.into());
    row
}

fn read_features(path: &Path) -> Vec<geojson::Feature> {
    let body = fs::read_to_string(path).expect("failed reading geojson output");
    let parsed: GeoJson = body.parse().expect("output should be valid geojson");
    match parsed {
        GeoJson::FeatureCollection(collection) => collection.features,
        other => panic!("expected a feature collection, got {other:?}"),
    }
}

fn property<'a>(feature: &'a geojson::Feature, name: &str) -> &'a Value {
    feature
        .properties
        .as_ref()
        .expect("feature should carry properties")
        .get(name)
        .expect("property should be present")
}

fn feature_by_label<'a>(features: &'a [geojson::Feature], label: &str) -> &'a geojson::Feature {
    features
        .iter()
        .find(|feature| property(feature, "MAP_LABEL") == &Value::String(label.to_string()))
        .expect("feature with label should exist")
}

#[test]
fn two_unit_one_iha_record_collapses_to_one_row() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let layer = write_org_layer(temp.path());
    let config = RunConfig::new(2024, temp.path()).with_org_layer(layer);

    // A1 fans out across two landscape units; the IHA join repeats id 42 on
    // both rows. B1 sits outside every organization polygon and has no IHA.
    let records = vec![
        tenure_row("A1", "LU2", Some(42), "POLYGON((0 0,10 0,10 10,0 10,0 0))"),
        tenure_row("A1", "LU1", Some(42), "POLYGON((0 0,10 0,10 10,0 10,0 0))"),
        tenure_row(
            "B1",
            "LU1",
            None,
            "POLYGON((100 100,110 100,110 110,100 110,100 100))",
        ),
    ];
    let executor = InMemoryExecutor::default()
        .with_units(["LU1", "LU2"])
        .with_records(RecordType::TenurePolygon, records);

    let summary = run(&config, &executor).expect("run should succeed");
    assert_eq!(summary.year, 2024);
    assert_eq!(summary.reports.get(&RecordType::TenurePolygon), Some(&2));
    assert_eq!(summary.reports.len(), 1, "empty types must not be staged");
    assert!(summary.workbook_path.exists());

    let features = read_features(&config.spatial_path("forest_auth"));
    assert_eq!(features.len(), 2, "one feature per map label");

    let a1 = feature_by_label(&features, "A1");
    assert_eq!(property(a1, "LANDSCAPE_UNIT"), "LU1; LU2");
    assert_eq!(property(a1, "IHA_ID"), "42");
    assert_eq!(property(a1, "IS_IHA"), "YES");
    assert_eq!(property(a1, "FN"), "Org A & Org B");
    assert_eq!(property(a1, "REGION"), "South");
    assert_eq!(property(a1, "NEW_AMEND"), "New");
    assert_eq!(property(a1, "TENURE_LENGTH_YRS"), "7");
    assert_eq!(property(a1, "ISSUE_DATE"), "2024-03-01");
    assert_eq!(property(a1, "AGENCY"), "FOR");
    assert!(a1.geometry.is_some());

    let b1 = feature_by_label(&features, "B1");
    assert_eq!(property(b1, "IS_IHA"), "NO");
    assert_eq!(property(b1, "IHA_ID"), &Value::Null);
    assert_eq!(property(b1, "FN"), &Value::Null);
}

#[test]
fn amendment_outside_window_excludes_the_record() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let layer = write_org_layer(temp.path());
    let config = RunConfig::new(2024, temp.path()).with_org_layer(layer);

    let mut stale = tenure_row("A1", "LU1", None, "POLYGON((0 0,1 0,1 1,0 1,0 0))");
    stale.insert("AMEND_DATE".to_string(), date(2019, 1, 1).into());
    let executor = InMemoryExecutor::default()
        .with_units(["LU1"])
        .with_records(RecordType::TenurePolygon, vec![stale]);

    let summary = run(&config, &executor).expect("run should succeed");
    assert!(summary.reports.is_empty());
    assert!(!config.spatial_path("forest_auth").exists());
    assert!(summary.workbook_path.exists(), "workbook is always written");
}

#[test]
fn unreadable_boundary_layer_skips_the_type_but_not_the_run() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let config =
        RunConfig::new(2024, temp.path()).with_org_layer(temp.path().join("layer.gdb"));

    let executor = InMemoryExecutor::default().with_units(["LU1"]).with_records(
        RecordType::TenurePolygon,
        vec![tenure_row(
            "A1",
            "LU1",
            None,
            "POLYGON((0 0,1 0,1 1,0 1,0 0))",
        )],
    );

    let summary = run(&config, &executor).expect("layer failure must not abort the run");
    assert!(summary.reports.is_empty());
    assert!(summary.workbook_path.exists());
}
