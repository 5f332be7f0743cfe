//! Integration tests for the model providers.
//!
//! These tests verify the complete provider workflow including:
//! - Dataset loading from GeoJSON files
//! - Leaf and composite spatial queries
//! - Ordered concatenation across providers

use std::fs;
use std::path::PathBuf;

use assetquery::provider::{DatasetProvider, MultiModelProvider, SpatialQuery};
use assetquery::roi::RegionOfInterest;
use serde_json::json;

// =============================================================================
// Test Helpers
// =============================================================================

/// Writes a one-cell dataset covering the given bounding box.
fn write_bbox_dataset(
    dir: &std::path::Path,
    file: &str,
    name: &str,
    lonmin: f64,
    lonmax: f64,
    latmin: f64,
    latmax: f64,
) -> PathBuf {
    let dataset = json!({
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {
                "gid": name,
                "name": name,
                "expo": json!({
                    "id": [format!("AREA # {name}")],
                    "Region": [name],
                    "Taxonomy": ["MUR"],
                    "Buildings": [3.0],
                }).to_string(),
            },
            "geometry": {
                "type": "Polygon",
                "coordinates": [[
                    [lonmin, latmin],
                    [lonmin, latmax],
                    [lonmax, latmax],
                    [lonmax, latmin],
                    [lonmin, latmin],
                ]],
            },
        }],
    });
    let path = dir.join(file);
    fs::write(&path, dataset.to_string()).unwrap();
    path
}

/// One provider for a Germany-like cell, one for a Chile-like cell.
fn two_country_composite(dir: &std::path::Path) -> MultiModelProvider {
    let germany = write_bbox_dataset(dir, "germany.geojson", "germany", 50.0, 55.0, 10.0, 15.0);
    let chile = write_bbox_dataset(dir, "chile.geojson", "chile", -80.0, -65.0, -70.0, -30.0);

    MultiModelProvider::from_providers(vec![
        Box::new(DatasetProvider::from_file(&germany).unwrap()),
        Box::new(DatasetProvider::from_file(&chile).unwrap()),
    ])
}

fn roi_world() -> RegionOfInterest {
    RegionOfInterest::new(-180.0, 180.0, -90.0, 90.0).unwrap()
}

fn roi_ne_hemisphere() -> RegionOfInterest {
    RegionOfInterest::new(0.0, 180.0, 0.0, 90.0).unwrap()
}

/// Strictly inside the Germany cell's bounding box.
fn roi_smaller_than_germany() -> RegionOfInterest {
    RegionOfInterest::new(51.0, 54.0, 11.0, 14.0).unwrap()
}

// =============================================================================
// Integration Tests
// =============================================================================

#[test]
fn test_within_across_providers() {
    let dir = tempfile::tempdir().unwrap();
    let provider = two_country_composite(dir.path());

    assert_eq!(provider.within(&roi_world()).len(), 2);
    assert_eq!(provider.within(&roi_ne_hemisphere()).len(), 1);
    assert_eq!(provider.within(&roi_smaller_than_germany()).len(), 0);
}

#[test]
fn test_intersects_across_providers() {
    let dir = tempfile::tempdir().unwrap();
    let provider = two_country_composite(dir.path());

    assert_eq!(provider.intersects(&roi_world()).len(), 2);
    assert_eq!(provider.intersects(&roi_ne_hemisphere()).len(), 1);
    assert_eq!(provider.intersects(&roi_smaller_than_germany()).len(), 1);
}

#[test]
fn test_single_provider_two_cells() {
    // Same cases, but both cells in one dataset file.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("both.geojson");
    let germany = write_bbox_dataset(dir.path(), "g.geojson", "germany", 50.0, 55.0, 10.0, 15.0);
    let chile = write_bbox_dataset(dir.path(), "c.geojson", "chile", -80.0, -65.0, -70.0, -30.0);

    let g: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&germany).unwrap()).unwrap();
    let c: serde_json::Value = serde_json::from_str(&fs::read_to_string(&chile).unwrap()).unwrap();
    let merged = json!({
        "type": "FeatureCollection",
        "features": [g["features"][0], c["features"][0]],
    });
    fs::write(&path, merged.to_string()).unwrap();

    let provider = DatasetProvider::from_file(&path).unwrap();
    assert_eq!(provider.len(), 2);
    assert_eq!(provider.within(&roi_world()).len(), 2);
    assert_eq!(provider.within(&roi_ne_hemisphere()).len(), 1);
    assert_eq!(provider.within(&roi_smaller_than_germany()).len(), 0);
    assert_eq!(provider.intersects(&roi_smaller_than_germany()).len(), 1);
}

#[test]
fn test_results_concatenated_in_provider_order() {
    let dir = tempfile::tempdir().unwrap();
    let provider = two_country_composite(dir.path());

    let names: Vec<String> = provider
        .within(&roi_world())
        .into_iter()
        .map(|cell| cell.name)
        .collect();
    assert_eq!(names, vec!["germany", "chile"]);
}

#[test]
fn test_loaded_cells_carry_parsed_records() {
    let dir = tempfile::tempdir().unwrap();
    let provider = two_country_composite(dir.path());

    let cells = provider.within(&roi_world());
    for cell in &cells {
        assert_eq!(cell.records.len(), 1);
        assert_eq!(cell.records[0].taxonomy, "MUR");
        assert_eq!(cell.records[0].buildings, 3.0);
    }
}

#[test]
fn test_within_is_subset_of_intersects() {
    let dir = tempfile::tempdir().unwrap();
    let provider = two_country_composite(dir.path());

    for roi in [roi_world(), roi_ne_hemisphere(), roi_smaller_than_germany()] {
        let within = provider.within(&roi);
        let intersects = provider.intersects(&roi);
        for cell in &within {
            assert!(
                intersects.iter().any(|c| c.id == cell.id),
                "cell {} in within but not in intersects",
                cell.id
            );
        }
    }
}
