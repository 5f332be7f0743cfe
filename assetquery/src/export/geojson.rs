//! GeoJSON FeatureCollection export
//!
//! Writes a query result as a FeatureCollection, one feature per geocell.
//! The exposure payload rides along as a structured nested property, not
//! flattened into columns.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use geojson::{Feature, FeatureCollection};
use serde_json::{Map, Value};
use tracing::debug;

use super::ExportError;
use crate::model::GeoCell;

/// JSON value kind of one feature property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    String,
    Integer,
    Float,
    Bool,
    Object,
    Array,
}

/// Column/type schema of a feature collection.
///
/// Inferred from a populated result set. Schema inference over zero rows
/// cannot determine property types, so the empty result uses a fixed
/// fallback: `MultiPolygon` geometry and no declared properties.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSchema {
    /// Geometry type of every feature
    pub geometry_type: String,
    /// Property name to value-kind map
    pub properties: BTreeMap<String, PropertyKind>,
}

impl FeatureSchema {
    /// The fixed schema used for empty result sets.
    pub fn fallback() -> Self {
        Self {
            geometry_type: "MultiPolygon".to_string(),
            properties: BTreeMap::new(),
        }
    }

    /// Infers the schema from a result set.
    ///
    /// Property kinds are taken from the first cell that carries a non-null
    /// value for each property. Empty input yields the fallback schema.
    pub fn infer(result: &[GeoCell]) -> Self {
        if result.is_empty() {
            return Self::fallback();
        }

        let mut properties = BTreeMap::new();
        for cell in result {
            for (name, value) in cell_properties(cell) {
                if let Some(kind) = kind_of(&value) {
                    properties.entry(name.to_string()).or_insert(kind);
                }
            }
        }

        Self {
            geometry_type: "MultiPolygon".to_string(),
            properties,
        }
    }
}

/// Exporter for the generic geospatial interchange format.
pub struct GeoJsonExporter {
    schema: FeatureSchema,
}

impl GeoJsonExporter {
    /// Creates an exporter with the schema inferred from `result`.
    pub fn for_result(result: &[GeoCell]) -> Self {
        let schema = FeatureSchema::infer(result);
        debug!(?schema, "inferred feature schema");
        Self { schema }
    }

    /// The schema this exporter will emit.
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Builds the FeatureCollection for a result set.
    ///
    /// Every feature carries the full schema property set; properties a cell
    /// has no value for are emitted as `null` so that columns stay
    /// homogeneous across rows.
    pub fn feature_collection(&self, result: &[GeoCell]) -> FeatureCollection {
        let features = result
            .iter()
            .map(|cell| {
                let mut properties = Map::new();
                for name in self.schema.properties.keys() {
                    let value = cell_properties(cell)
                        .into_iter()
                        .find(|(n, _)| *n == name.as_str())
                        .map(|(_, v)| v)
                        .unwrap_or(Value::Null);
                    properties.insert(name.clone(), value);
                }
                Feature {
                    bbox: None,
                    geometry: Some(geojson::Geometry::new(geojson::Value::from(
                        &cell.geometry,
                    ))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }

    /// Writes the result set to `path`.
    ///
    /// Any pre-existing file at `path` is deleted first; the underlying
    /// format has no notion of in-place overwrite. An empty result writes a
    /// FeatureCollection with zero features - never an error.
    pub fn write(&self, result: &[GeoCell], path: &Path) -> Result<(), ExportError> {
        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(source) => {
                return Err(ExportError::Write {
                    path: path.to_path_buf(),
                    source,
                })
            }
        }

        let collection = self.feature_collection(result);
        let serialized = serde_json::to_string(&collection)?;
        fs::write(path, serialized).map_err(|source| ExportError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The properties a geocell contributes to its feature.
fn cell_properties(cell: &GeoCell) -> Vec<(&'static str, Value)> {
    vec![
        ("id", Value::String(cell.id.clone())),
        ("name", Value::String(cell.name.clone())),
        ("expo", cell.expo.clone()),
    ]
}

fn kind_of(value: &Value) -> Option<PropertyKind> {
    match value {
        Value::Null => None,
        Value::Bool(_) => Some(PropertyKind::Bool),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(PropertyKind::Integer),
        Value::Number(_) => Some(PropertyKind::Float),
        Value::String(_) => Some(PropertyKind::String),
        Value::Array(_) => Some(PropertyKind::Array),
        Value::Object(_) => Some(PropertyKind::Object),
    }
}
