//! Geocell type definitions

use geo::{Geometry, MultiPolygon};
use serde_json::Value;

use super::TaxonomyRecord;

/// One spatial unit of an exposure model.
///
/// A geocell is a polygonal area aggregating building-stock statistics for
/// the structures inside it. The embedded exposure table is kept twice: as
/// typed [`TaxonomyRecord`]s for the NRML exporter, and as the structured
/// JSON value for GeoJSON re-export (where the payload stays a nested
/// sub-object).
#[derive(Debug, Clone, PartialEq)]
pub struct GeoCell {
    /// Unique id of the geocell within its dataset
    pub id: String,
    /// Display name (e.g. a district name)
    pub name: String,
    /// Cell boundary; single polygons are promoted on load
    pub geometry: MultiPolygon<f64>,
    /// Exposure payload as structured JSON (`Null` when absent)
    pub expo: Value,
    /// Typed exposure records, in payload order
    pub records: Vec<TaxonomyRecord>,
}

impl GeoCell {
    /// Whether this cell carries any exposure records.
    pub fn has_exposure(&self) -> bool {
        !self.records.is_empty()
    }
}

/// Promotes a geometry to a multi-polygon.
///
/// Datasets store cell boundaries as either `Polygon` or `MultiPolygon`;
/// everything downstream works on multi-polygons. Returns `None` for any
/// other geometry type.
pub fn to_multi_polygon(geometry: Geometry<f64>) -> Option<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Some(MultiPolygon(vec![p])),
        Geometry::MultiPolygon(mp) => Some(mp),
        _ => None,
    }
}
