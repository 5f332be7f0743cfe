//! Composite provider
//!
//! Fans spatial predicates out over an ordered list of providers and
//! concatenates the results.

use super::types::{QueryResult, SpatialQuery};
use crate::roi::RegionOfInterest;

/// Composite provider over an ordered list of models.
///
/// Each predicate is invoked on every underlying provider independently and
/// the per-provider results are concatenated in provider-list order. Row
/// identity is renumbered by position; results are NOT deduplicated: a
/// geocell physically present in two overlapping datasets is returned twice.
/// That is the contract, not an accident - downstream consumers rely on
/// seeing every dataset's contribution.
#[derive(Default)]
pub struct MultiModelProvider {
    providers: Vec<Box<dyn SpatialQuery>>,
}

impl MultiModelProvider {
    /// Creates an empty composite.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a composite from an ordered provider list.
    pub fn from_providers(providers: Vec<Box<dyn SpatialQuery>>) -> Self {
        Self { providers }
    }

    /// Appends a provider; it will be queried after all earlier ones.
    pub fn push(&mut self, provider: Box<dyn SpatialQuery>) {
        self.providers.push(provider);
    }

    /// Number of composed providers.
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether the composite holds no providers.
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl SpatialQuery for MultiModelProvider {
    fn within(&self, roi: &RegionOfInterest) -> QueryResult {
        self.providers
            .iter()
            .flat_map(|provider| provider.within(roi))
            .collect()
    }

    fn intersects(&self, roi: &RegionOfInterest) -> QueryResult {
        self.providers
            .iter()
            .flat_map(|provider| provider.intersects(roi))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GeoCell;
    use crate::provider::DatasetProvider;
    use geo::{polygon, MultiPolygon};
    use serde_json::Value;

    fn bbox_cell(name: &str, lonmin: f64, lonmax: f64, latmin: f64, latmax: f64) -> GeoCell {
        let ring = polygon![
            (x: lonmin, y: latmin),
            (x: lonmin, y: latmax),
            (x: lonmax, y: latmax),
            (x: lonmax, y: latmin),
            (x: lonmin, y: latmin),
        ];
        GeoCell {
            id: name.to_string(),
            name: name.to_string(),
            geometry: MultiPolygon(vec![ring]),
            expo: Value::Null,
            records: vec![],
        }
    }

    fn composite() -> MultiModelProvider {
        // One provider per country, mirroring a one-file-per-model schema.
        let germany =
            DatasetProvider::from_cells("germany", vec![bbox_cell("germany", 50.0, 55.0, 10.0, 15.0)]);
        let chile =
            DatasetProvider::from_cells("chile", vec![bbox_cell("chile", -80.0, -65.0, -70.0, -30.0)]);
        MultiModelProvider::from_providers(vec![Box::new(germany), Box::new(chile)])
    }

    #[test]
    fn test_within_world() {
        let roi = RegionOfInterest::new(-180.0, 180.0, -90.0, 90.0).unwrap();
        assert_eq!(composite().within(&roi).len(), 2);
    }

    #[test]
    fn test_within_ne_hemisphere() {
        let roi = RegionOfInterest::new(0.0, 180.0, 0.0, 90.0).unwrap();
        let result = composite().within(&roi);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "germany");
    }

    #[test]
    fn test_tight_roi_within_zero_intersects_one() {
        let roi = RegionOfInterest::new(51.0, 54.0, 11.0, 14.0).unwrap();
        let c = composite();
        assert_eq!(c.within(&roi).len(), 0);
        assert_eq!(c.intersects(&roi).len(), 1);
    }

    #[test]
    fn test_concatenation_in_provider_order() {
        let roi = RegionOfInterest::new(-180.0, 180.0, -90.0, 90.0).unwrap();
        let names: Vec<String> = composite()
            .within(&roi)
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["germany", "chile"]);
    }

    #[test]
    fn test_overlapping_datasets_yield_duplicates() {
        let a = DatasetProvider::from_cells("a", vec![bbox_cell("same", 0.0, 1.0, 0.0, 1.0)]);
        let b = DatasetProvider::from_cells("b", vec![bbox_cell("same", 0.0, 1.0, 0.0, 1.0)]);
        let multi = MultiModelProvider::from_providers(vec![Box::new(a), Box::new(b)]);
        let roi = RegionOfInterest::new(-10.0, 10.0, -10.0, 10.0).unwrap();
        assert_eq!(multi.within(&roi).len(), 2);
    }

    #[test]
    fn test_empty_composite_yields_empty() {
        let roi = RegionOfInterest::new(-180.0, 180.0, -90.0, 90.0).unwrap();
        let multi = MultiModelProvider::new();
        assert!(multi.within(&roi).is_empty());
        assert!(multi.intersects(&roi).is_empty());
    }
}
