use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use frpa_reporting::record::Row;
use frpa_reporting::source::InMemoryExecutor;
use frpa_reporting::{run, RecordType, RunConfig};
use geojson::GeoJson;
use serde_json::Value;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

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
                    "coordinates": [[[0,0],[10,0],[10,10],[0,10],[0,0]]]
                }
            }
        ]
    }"#;
    fs::write(&path, body).expect("failed writing boundary layer");
    path
}

fn road_row(label: &str, user: &str) -> Row {
    let mut row = Row::new();
    row.insert("MAP_LABEL".to_string(), label.into());
    row.insert("AWARD_DATE".to_string(), date(2024, 2, 1).into());
    row.insert("EXPIRY_DATE".to_string(), date(2026, 2, 1).into());
    row.insert("UPDATE_USERID".to_string(), user.into());
    row.insert("GEOGRAPHIC_DISTRICT_CODE".to_string(), "DNI".into());
    row.insert("ROAD_SECTION_LENGTH_KM".to_string(), 1.4_f64.into());
    row.insert("SHAPE".to_string(), "LINESTRING(1 5,9 5)".into());
    row
}

fn unit_row(label: &str, unit: &str) -> Row {
    let mut row = Row::new();
    row.insert("MAP_LABEL".to_string(), label.into());
    row.insert("LANDSCAPE_UNIT".to_string(), unit.into());
    row
}

fn features_at(path: &Path) -> Vec<geojson::Feature> {
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

#[test]
fn road_units_come_from_the_deferred_fetch() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let layer = write_org_layer(temp.path());
    let config = RunConfig::new(2024, temp.path()).with_org_layer(layer);

    // The record rows carry no unit column at all; the pipeline must fill it
    // from the label-scoped unit query. A datafix maintenance row rides along
    // and must be dropped before anything else happens.
    let executor = InMemoryExecutor::default()
        .with_units(["LU1", "LU2"])
        .with_records(
            RecordType::RoadLine,
            vec![road_row("R1 2", "IDIR\\JDOE"), road_row("R9 1", "batch_DATAFIX")],
        )
        .with_road_units(vec![unit_row("R1 2", "LU2"), unit_row("R1 2", "LU1")]);

    let summary = run(&config, &executor).expect("run should succeed");
    assert_eq!(summary.reports.get(&RecordType::RoadLine), Some(&1));

    let features = features_at(&config.spatial_path("forest_road"));
    assert_eq!(features.len(), 1);
    let road = &features[0];
    assert_eq!(property(road, "MAP_LABEL"), "R1 2");
    assert_eq!(property(road, "LANDSCAPE_UNIT"), "LU1; LU2");
    assert_eq!(property(road, "FN"), "Org A");
    assert_eq!(property(road, "REGION"), "North");
    assert_eq!(property(road, "TENURE_LENGTH_YRS"), "2");
    assert_eq!(
        property(road, "ROAD_SECTION_LENGTH_KM"),
        &Value::from(1.4_f64)
    );
}

#[test]
fn recreation_output_clears_the_file_type_code() {
    let temp = tempfile::tempdir().expect("failed creating tempdir");
    let layer = write_org_layer(temp.path());
    let config = RunConfig::new(2024, temp.path()).with_org_layer(layer);

    let mut row = Row::new();
    row.insert("MAP_LABEL".to_string(), "REC100".into());
    row.insert("PROJECT_ESTABLISHED_DATE".to_string(), date(2024, 4, 1).into());
    row.insert("PROJECT_TYPE".to_string(), "Recreation Trail".into());
    row.insert("FILE_TYPE_CODE".to_string(), "RTR".into());
    row.insert("UPDATE_USERID".to_string(), "IDIR\\JDOE".into());
    row.insert("GEOGRAPHIC_DISTRICT_CODE".to_string(), "DSI".into());
    row.insert("LANDSCAPE_UNIT".to_string(), "LU1".into());
    row.insert("SHAPE".to_string(), "POLYGON((2 2,4 2,4 4,2 4,2 2))".into());

    let executor = InMemoryExecutor::default()
        .with_units(["LU1"])
        .with_records(RecordType::RecreationPolygon, vec![row]);

    let summary = run(&config, &executor).expect("run should succeed");
    assert_eq!(summary.reports.get(&RecordType::RecreationPolygon), Some(&1));

    let features = features_at(&config.spatial_path("recr_poly"));
    let rec = &features[0];
    assert_eq!(property(rec, "FILE_TYPE_CODE"), &Value::Null);
    assert_eq!(property(rec, "PROJECT_TYPE"), "Recreation Trail");
    assert_eq!(property(rec, "REGION"), "South");
    assert_eq!(property(rec, "NEW_AMEND"), "Amended");
    assert_eq!(property(rec, "TENURE_LENGTH_YRS"), "N/A");
}
