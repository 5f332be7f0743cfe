//! Query configuration settings

use std::path::PathBuf;

use super::{discover_schemas, ConfigError, QueryMode};

/// Default file name of the GeoJSON output.
pub const DEFAULT_GEOJSON_FILE: &str = "query_output.geojson";

/// Default file name of the NRML output.
pub const DEFAULT_XML_FILE: &str = "query_output.xml";

/// File extension of dataset files inside a schema directory.
const DATASET_EXTENSION: &str = "geojson";

/// Suffix of the metadata file inside a schema directory.
const METADATA_SUFFIX: &str = "_meta.json";

/// Suffix of the property dictionary inside a schema directory.
const DICTIONARY_SUFFIX: &str = "_dict.csv";

/// Resolved configuration of one query invocation.
///
/// Constructed once at startup; every path the pipeline touches derives from
/// here.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Root directory holding one subdirectory per schema
    pub schemas_dir: PathBuf,
    /// Schema name (must match a subdirectory of `schemas_dir`)
    pub schema: String,
    /// Type of exposed assets (e.g. `res`); carried through and logged,
    /// not used for filtering
    pub asset_type: String,
    /// Spatial predicate to evaluate
    pub mode: QueryMode,
    /// When set, only dataset files whose stem contains this string load
    pub model_filter: Option<String>,
    /// Directory receiving the two output files
    pub output_dir: PathBuf,
    /// GeoJSON output file name
    pub geojson_file: String,
    /// NRML output file name
    pub xml_file: String,
}

impl QueryConfig {
    /// Creates a configuration with the default output file names.
    pub fn new(
        schemas_dir: impl Into<PathBuf>,
        schema: impl Into<String>,
        asset_type: impl Into<String>,
        mode: QueryMode,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            schemas_dir: schemas_dir.into(),
            schema: schema.into(),
            asset_type: asset_type.into(),
            mode,
            model_filter: None,
            output_dir: output_dir.into(),
            geojson_file: DEFAULT_GEOJSON_FILE.to_string(),
            xml_file: DEFAULT_XML_FILE.to_string(),
        }
    }

    /// Restricts dataset loading to files whose stem contains `filter`.
    pub fn with_model_filter(mut self, filter: Option<String>) -> Self {
        self.model_filter = filter;
        self
    }

    /// The schema's directory under the schemas root.
    pub fn schema_dir(&self) -> PathBuf {
        self.schemas_dir.join(&self.schema)
    }

    /// Path of the schema's metadata file (`<schema>_meta.json`).
    pub fn metadata_path(&self) -> PathBuf {
        self.schema_dir()
            .join(format!("{}{}", self.schema, METADATA_SUFFIX))
    }

    /// Path of the schema's property dictionary (`<schema>_dict.csv`).
    pub fn dictionary_path(&self) -> PathBuf {
        self.schema_dir()
            .join(format!("{}{}", self.schema, DICTIONARY_SUFFIX))
    }

    /// Path of the GeoJSON output file.
    pub fn geojson_output_path(&self) -> PathBuf {
        self.output_dir.join(&self.geojson_file)
    }

    /// Path of the NRML output file.
    pub fn xml_output_path(&self) -> PathBuf {
        self.output_dir.join(&self.xml_file)
    }

    /// Verifies the configured schema exists under the schemas root.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedSchema`] naming the discovered
    /// schemas when the configured one is absent.
    pub fn validate_schema(&self) -> Result<(), ConfigError> {
        let supported = discover_schemas(&self.schemas_dir)?;
        if supported.iter().any(|s| s == &self.schema) {
            Ok(())
        } else {
            Err(ConfigError::UnsupportedSchema {
                schema: self.schema.clone(),
                supported,
            })
        }
    }

    /// Resolves the dataset files of the configured schema.
    ///
    /// All `*.geojson` files in the schema directory, sorted by file name
    /// for a deterministic provider order, optionally narrowed by the model
    /// filter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoDatasets`] when nothing matches - an empty
    /// provider list would silently answer every query with zero rows.
    pub fn dataset_paths(&self) -> Result<Vec<PathBuf>, ConfigError> {
        let dir = self.schema_dir();
        let entries = std::fs::read_dir(&dir).map_err(|source| ConfigError::SchemasDir {
            path: dir.clone(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ConfigError::SchemasDir {
                path: dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DATASET_EXTENSION) {
                continue;
            }
            if let Some(filter) = &self.model_filter {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if !stem.contains(filter.as_str()) {
                    continue;
                }
            }
            paths.push(path);
        }
        paths.sort();

        if paths.is_empty() {
            return Err(ConfigError::NoDatasets { path: dir });
        }
        Ok(paths)
    }
}
