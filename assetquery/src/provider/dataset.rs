//! Single-dataset provider
//!
//! Loads one GeoJSON dataset file into an ordered in-memory geocell
//! collection and answers spatial predicates against it.

use std::fs;
use std::path::Path;

use geo::{Contains, Intersects};
use geojson::{Feature, GeoJson};
use serde_json::Value;
use tracing::debug;

use super::types::{DatasetError, QueryResult, SpatialQuery};
use crate::model::{parse_payload, to_multi_polygon, GeoCell};
use crate::roi::RegionOfInterest;

/// Provider backed by a single dataset file.
///
/// Geocells keep the file's feature order; queries return subsequences of
/// that order.
#[derive(Debug, Clone)]
pub struct DatasetProvider {
    name: String,
    cells: Vec<GeoCell>,
}

impl DatasetProvider {
    /// Loads a dataset from a GeoJSON FeatureCollection file.
    ///
    /// Every feature must carry a polygon or multi-polygon geometry; single
    /// polygons are promoted to multi-polygons. The embedded exposure
    /// payload is parsed here, once, so that exporters never re-parse it.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError`] if the file is unreadable, is not a
    /// FeatureCollection, or any feature has a missing/unsupported geometry
    /// or malformed payload.
    pub fn from_file(path: &Path) -> Result<Self, DatasetError> {
        let contents = fs::read_to_string(path).map_err(|source| DatasetError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let geojson: GeoJson = contents.parse().map_err(|source| DatasetError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            _ => {
                return Err(DatasetError::NotFeatureCollection {
                    path: path.to_path_buf(),
                })
            }
        };

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut cells = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.into_iter().enumerate() {
            cells.push(cell_from_feature(feature, index)?);
        }

        debug!(dataset = %name, cells = cells.len(), "loaded dataset");
        Ok(Self { name, cells })
    }

    /// Builds a provider from already-constructed cells.
    pub fn from_cells(name: impl Into<String>, cells: Vec<GeoCell>) -> Self {
        Self {
            name: name.into(),
            cells,
        }
    }

    /// The provider's name (dataset file stem) for logging.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of geocells in the dataset.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Whether the dataset holds no geocells.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl SpatialQuery for DatasetProvider {
    fn within(&self, roi: &RegionOfInterest) -> QueryResult {
        self.cells
            .iter()
            .filter(|cell| roi.polygon().contains(&cell.geometry))
            .cloned()
            .collect()
    }

    fn intersects(&self, roi: &RegionOfInterest) -> QueryResult {
        self.cells
            .iter()
            .filter(|cell| roi.polygon().intersects(&cell.geometry))
            .cloned()
            .collect()
    }
}

/// Converts one GeoJSON feature into a geocell.
fn cell_from_feature(feature: Feature, index: usize) -> Result<GeoCell, DatasetError> {
    let id = feature_id(&feature, index);

    let geometry = feature.geometry.ok_or_else(|| DatasetError::MissingGeometry {
        cell: id.clone(),
    })?;
    let geometry: geo::Geometry<f64> =
        geometry
            .value
            .try_into()
            .map_err(|source| DatasetError::MalformedGeometry {
                cell: id.clone(),
                source,
            })?;
    let geometry =
        to_multi_polygon(geometry).ok_or_else(|| DatasetError::UnsupportedGeometry {
            cell: id.clone(),
        })?;

    let properties = feature.properties.unwrap_or_default();
    let name = properties
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    // Decode a string-encoded payload up front; the structured form is what
    // the GeoJSON exporter re-emits.
    let expo = match properties.get("expo").cloned().unwrap_or(Value::Null) {
        Value::String(s) if s.trim().is_empty() => Value::Null,
        Value::String(s) => {
            serde_json::from_str(&s).map_err(|e| DatasetError::Payload {
                cell: id.clone(),
                source: e.into(),
            })?
        }
        other => other,
    };
    let records = parse_payload(&expo).map_err(|source| DatasetError::Payload {
        cell: id.clone(),
        source,
    })?;

    Ok(GeoCell {
        id,
        name,
        geometry,
        expo,
        records,
    })
}

/// Resolves a feature's id.
///
/// Dataset generations disagree on the column: newer files use `gid`, older
/// GeoPackage exports `fid`, some plain `id`; the GeoJSON feature id is the
/// last resort before falling back to the row index.
fn feature_id(feature: &Feature, index: usize) -> String {
    for key in ["gid", "fid", "id"] {
        if let Some(value) = feature.properties.as_ref().and_then(|p| p.get(key)) {
            match value {
                Value::String(s) => return s.clone(),
                Value::Number(n) => return n.to_string(),
                _ => {}
            }
        }
    }
    match &feature.id {
        Some(geojson::feature::Id::String(s)) => s.clone(),
        Some(geojson::feature::Id::Number(n)) => n.to_string(),
        None => index.to_string(),
    }
}
