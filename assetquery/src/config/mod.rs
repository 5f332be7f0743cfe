//! Query configuration
//!
//! An explicit configuration value resolved once at startup and passed to
//! every stage - no cwd-relative path lookups anywhere downstream.
//!
//! # Directory Conventions
//!
//! A schemas root holds one directory per exposure schema:
//!
//! ```text
//! schemas/
//!   SARA_v1.0/
//!     SARA_v1.0_data.geojson     dataset file(s), any *.geojson
//!     SARA_v1.0_meta.json        exposure metadata
//!     SARA_v1.0_dict.csv         taxonomy property dictionary
//! ```
//!
//! Supported schemas are discovered by scanning the root, not hardcoded.

mod settings;

pub use settings::{QueryConfig, DEFAULT_GEOJSON_FILE, DEFAULT_XML_FILE};

use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Errors that can occur while resolving the query configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Query mode string is neither `within` nor `intersects`
    #[error("query mode '{0}' not supported (use 'within' or 'intersects')")]
    UnsupportedQueryMode(String),

    /// Schema directory does not exist under the schemas root
    #[error("schema '{schema}' not supported (available: {})", supported.join(", "))]
    UnsupportedSchema {
        schema: String,
        supported: Vec<String>,
    },

    /// Schemas root could not be scanned
    #[error("failed to scan schemas directory '{}': {source}", path.display())]
    SchemasDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Schema directory holds no dataset files
    #[error("schema directory '{}' contains no dataset files", path.display())]
    NoDatasets { path: PathBuf },
}

/// Spatial predicate selected for a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Geometry must lie entirely inside the region
    Within,
    /// Geometry must share at least one point with the region
    Intersects,
}

impl QueryMode {
    /// The mode's wire name, as accepted on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Within => "within",
            QueryMode::Intersects => "intersects",
        }
    }
}

impl FromStr for QueryMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "within" => Ok(QueryMode::Within),
            "intersects" => Ok(QueryMode::Intersects),
            other => Err(ConfigError::UnsupportedQueryMode(other.to_string())),
        }
    }
}

impl std::fmt::Display for QueryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discovers the supported schemas by scanning the schemas root.
///
/// Every subdirectory is a schema; names are returned sorted.
pub fn discover_schemas(schemas_dir: &Path) -> Result<Vec<String>, ConfigError> {
    let entries = std::fs::read_dir(schemas_dir).map_err(|source| ConfigError::SchemasDir {
        path: schemas_dir.to_path_buf(),
        source,
    })?;

    let mut schemas = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| ConfigError::SchemasDir {
            path: schemas_dir.to_path_buf(),
            source,
        })?;
        if entry.path().is_dir() {
            schemas.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    schemas.sort();
    Ok(schemas)
}
