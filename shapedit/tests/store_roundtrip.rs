//! Integration tests for loading, editing and saving shapefiles on disk.
//!
//! Run with: `cargo test --test store_roundtrip`

mod common;

use tempfile::TempDir;

use shapedit::error::FileFormatError;
use shapedit::store::{self, AttributeType, AttributeValue, Crs, FeatureId, MassOperation};

use common::{parcels, write_shapefile, UTM_WKT, WGS84_WKT};

#[test]
fn test_edits_survive_save_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = write_shapefile(
        dir.path(),
        "parcels",
        &parcels(Crs::from_wkt(UTM_WKT), (500_000.0, 5_000_000.0), 100.0),
    );

    let mut collection = store::load(&path).unwrap();
    collection
        .set_attribute_text(FeatureId(1), "name", "South meadow")
        .unwrap();
    collection.delete_feature(FeatureId(2)).unwrap();
    collection
        .add_field("owner", AttributeType::Text { length: 30 }, "county")
        .unwrap();
    collection.remove_field("zone").unwrap();
    let changed = collection
        .mass_update(&["yield".to_string()], MassOperation::Multiply, 2.0)
        .unwrap();
    assert_eq!(changed, 2);

    let out = dir.path().join("edited.shp");
    store::save(&out, &collection).unwrap();
    let reloaded = store::load(&out).unwrap();

    assert_eq!(reloaded.len(), 2);
    let names: Vec<&str> = reloaded.schema().names().collect();
    assert_eq!(names, vec!["name", "yield", "owner"]);

    let second = reloaded.id_at(1).unwrap();
    assert_eq!(
        reloaded.get_attribute(second, "name").unwrap(),
        &AttributeValue::Text("South meadow".into())
    );
    assert_eq!(
        reloaded.get_attribute(second, "yield").unwrap(),
        &AttributeValue::Number(12.0)
    );
    assert_eq!(
        reloaded.get_attribute(second, "owner").unwrap(),
        &AttributeValue::Text("county".into())
    );
    assert_eq!(reloaded.crs(), collection.crs());
}

#[test]
fn test_geometry_round_trips_exactly() {
    let dir = TempDir::new().unwrap();
    let original = parcels(Crs::from_wkt(WGS84_WKT), (10.0, 45.0), 0.01);
    let path = write_shapefile(dir.path(), "geo", &original);

    let reloaded = store::load(&path).unwrap();
    assert_eq!(reloaded.bounds(), original.bounds());
    for (a, b) in original.features().iter().zip(reloaded.features()) {
        assert_eq!(a.geometry.bounds(), b.geometry.bounds());
        assert!((a.geometry.area() - b.geometry.area()).abs() < 1e-12);
    }
}

#[test]
fn test_statistics_for_projected_polygons() {
    let collection = parcels(Crs::from_wkt(UTM_WKT), (500_000.0, 5_000_000.0), 100.0);
    let stats = collection.statistics();

    let area = stats.area.unwrap();
    assert!((area.total - 30_000.0).abs() < 1e-6);
    assert!((area.mean - 10_000.0).abs() < 1e-6);

    let text = stats.to_string();
    assert!(text.contains("Number of features: 3"));
    assert!(text.contains("Total area: 30000.00 square units"));
    assert!(text.contains("WGS_1984_UTM_Zone_33N"));
}

#[test]
fn test_statistics_for_geographic_polygons_skip_area() {
    let collection = parcels(Crs::from_wkt(WGS84_WKT), (10.0, 45.0), 0.01);
    let stats = collection.statistics();
    assert!(stats.area.is_none());
    assert!(stats
        .to_string()
        .contains("Area statistics unavailable"));
}

#[test]
fn test_missing_dbf_is_unreadable() {
    let dir = TempDir::new().unwrap();
    let path = write_shapefile(dir.path(), "nodbf", &parcels(Crs::Unknown, (0.0, 0.0), 1.0));
    std::fs::remove_file(path.with_extension("dbf")).unwrap();

    assert!(matches!(
        store::load(&path),
        Err(FileFormatError::Unreadable { .. })
    ));
}

#[test]
fn test_truncated_shapefile_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_shapefile(
        dir.path(),
        "broken",
        &parcels(Crs::Unknown, (0.0, 0.0), 1.0),
    );
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    assert!(store::load(&path).is_err());
}
