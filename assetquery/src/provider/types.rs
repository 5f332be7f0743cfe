//! Provider types and traits

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{GeoCell, PayloadError};
use crate::roi::RegionOfInterest;

/// Ordered sequence of geocells produced by a spatial query.
///
/// Order is the dataset's original row order; for composite providers,
/// per-provider results concatenated in provider-list order. Never
/// deduplicated.
pub type QueryResult = Vec<GeoCell>;

/// Errors that can occur while loading a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Dataset file could not be read
    #[error("failed to read dataset '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Dataset file is not valid GeoJSON
    #[error("failed to parse dataset '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: geojson::Error,
    },

    /// Dataset is valid GeoJSON but not a FeatureCollection
    #[error("dataset '{}' is not a FeatureCollection", path.display())]
    NotFeatureCollection { path: PathBuf },

    /// A feature has no geometry
    #[error("feature '{cell}' has no geometry")]
    MissingGeometry { cell: String },

    /// A feature's geometry is not a polygon or multi-polygon
    #[error("feature '{cell}' has unsupported geometry type (expected Polygon or MultiPolygon)")]
    UnsupportedGeometry { cell: String },

    /// A feature's geometry coordinates could not be converted
    #[error("feature '{cell}' has malformed geometry: {source}")]
    MalformedGeometry {
        cell: String,
        #[source]
        source: geojson::Error,
    },

    /// A feature's exposure payload could not be parsed
    #[error("feature '{cell}' has a malformed exposure payload: {source}")]
    Payload {
        cell: String,
        #[source]
        source: PayloadError,
    },
}

/// Capability interface for spatial queries against an exposure model.
///
/// Both predicates preserve row order and perform no deduplication.
pub trait SpatialQuery {
    /// Returns the geocells whose geometry lies entirely inside the region.
    ///
    /// Boundary crossing disqualifies a cell: a geometry merely touching the
    /// region's edge from outside is not `within`.
    fn within(&self, roi: &RegionOfInterest) -> QueryResult;

    /// Returns the geocells whose geometry shares any point with the region,
    /// boundary included.
    fn intersects(&self, roi: &RegionOfInterest) -> QueryResult;
}
