//! Result-set exporters
//!
//! Serializes a query result into the two interchange formats consumed
//! downstream: a GeoJSON FeatureCollection ([`geojson`]) and an
//! OpenQuake-compliant NRML exposure document ([`nrml`]).

mod geojson;
mod nrml;

pub use geojson::{FeatureSchema, GeoJsonExporter, PropertyKind};
pub use nrml::{NrmlExporter, DEFAULT_COST_COEFFICIENT, GML_NAMESPACE, NRML_NAMESPACE};

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum ExportError {
    /// A record's taxonomy has no row in the property dictionary
    #[error("taxonomy '{taxonomy}' has no entry in the property dictionary")]
    TaxonomyLookupMiss { taxonomy: String },

    /// A geocell's geometry has no centroid (empty multi-polygon)
    #[error("geocell '{cell}' has an empty geometry, cannot place assets")]
    NoCentroid { cell: String },

    /// XML serialization failed
    #[error("failed to serialize XML: {0}")]
    Xml(#[source] std::io::Error),

    /// Serialized XML is not valid UTF-8
    #[error("serialized XML is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// JSON serialization failed
    #[error("failed to serialize GeoJSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Output file could not be written
    #[error("failed to write output '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
