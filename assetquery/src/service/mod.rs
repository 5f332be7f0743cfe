//! Query service facade
//!
//! Single entry point wrapping the whole pipeline: load, validate
//! preconditions, filter, export. Every precondition - schema, metadata,
//! dictionary, taxonomy consistency, datasets - is checked and the NRML
//! document fully rendered before the first byte of output hits the disk,
//! so a failing run never leaves a partial output pair behind.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::config::{ConfigError, QueryConfig, QueryMode};
use crate::dictionary::{DictionaryError, PropertyDictionary};
use crate::export::{ExportError, GeoJsonExporter, NrmlExporter};
use crate::metadata::{ExposureMetadata, MetadataError};
use crate::model::GeoCell;
use crate::provider::{DatasetError, DatasetProvider, MultiModelProvider, SpatialQuery};
use crate::roi::{RegionError, RegionOfInterest};
use thiserror::Error;

/// Classification of a query failure, for exit-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller asked for something invalid (bad region, unknown schema
    /// or mode)
    UserInput,
    /// The schema's data is inconsistent or unreadable
    DataIntegrity,
}

/// Errors that can occur while running a query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Region(#[from] RegionError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Dictionary(#[from] DictionaryError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Export(#[from] ExportError),

    /// The metadata's taxonomy list is not a subset of the dictionary
    #[error("taxonomies missing from the property dictionary: {}", missing.join(", "))]
    TaxonomyMismatch { missing: Vec<String> },

    /// Output directory could not be created
    #[error("failed to create output directory '{}': {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl QueryError {
    /// Classifies the failure as user input vs data integrity.
    pub fn class(&self) -> ErrorClass {
        match self {
            QueryError::Region(_) => ErrorClass::UserInput,
            QueryError::Config(_) => ErrorClass::UserInput,
            _ => ErrorClass::DataIntegrity,
        }
    }
}

/// Summary of a completed query run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryReport {
    /// Number of geocells matching the predicate
    pub matched: usize,
    /// Number of asset nodes in the NRML output
    pub assets: usize,
    /// Path of the written GeoJSON file
    pub geojson_path: PathBuf,
    /// Path of the written NRML file
    pub xml_path: PathBuf,
}

/// Facade running the full query/transform/export pipeline.
pub struct QueryService {
    config: QueryConfig,
}

impl QueryService {
    /// Creates a service for one resolved configuration.
    pub fn new(config: QueryConfig) -> Self {
        Self { config }
    }

    /// The service's configuration.
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Runs the pipeline for one region of interest.
    ///
    /// Stages: validate schema, load metadata and dictionary, check the
    /// taxonomy subset invariant, load datasets, evaluate the predicate,
    /// render the NRML document, then (and only then) write both outputs.
    pub fn run(&self, roi: &RegionOfInterest) -> Result<QueryReport, QueryError> {
        self.config.validate_schema()?;

        let metadata = ExposureMetadata::from_file(&self.config.metadata_path())?;
        let dictionary = PropertyDictionary::from_file(&self.config.dictionary_path())?;

        let missing = dictionary.missing_codes(metadata.taxonomies.iter().map(String::as_str));
        if !missing.is_empty() {
            return Err(QueryError::TaxonomyMismatch { missing });
        }

        let provider = self.load_datasets()?;
        info!(
            schema = %self.config.schema,
            asset_type = %self.config.asset_type,
            models = provider.len(),
            "exposure model loaded"
        );

        let result = match self.config.mode {
            QueryMode::Within => provider.within(roi),
            QueryMode::Intersects => provider.intersects(roi),
        };
        info!(
            mode = %self.config.mode,
            matched = result.len(),
            "spatial query complete"
        );

        // Render the NRML document before touching the filesystem: an
        // asset-level taxonomy miss must not leave a lone GeoJSON behind.
        let nrml = NrmlExporter::new(&metadata, &dictionary);
        let document = nrml.render(&result)?;
        let assets = count_assets(&result);

        fs::create_dir_all(&self.config.output_dir).map_err(|source| QueryError::OutputDir {
            path: self.config.output_dir.clone(),
            source,
        })?;

        let geojson_path = self.config.geojson_output_path();
        GeoJsonExporter::for_result(&result).write(&result, &geojson_path)?;

        let xml_path = self.config.xml_output_path();
        fs::write(&xml_path, document).map_err(|source| {
            QueryError::Export(ExportError::Write {
                path: xml_path.clone(),
                source,
            })
        })?;

        info!(
            geojson = %geojson_path.display(),
            xml = %xml_path.display(),
            assets,
            "outputs written"
        );

        Ok(QueryReport {
            matched: result.len(),
            assets,
            geojson_path,
            xml_path,
        })
    }

    fn load_datasets(&self) -> Result<MultiModelProvider, QueryError> {
        let mut provider = MultiModelProvider::new();
        for path in self.config.dataset_paths()? {
            provider.push(Box::new(DatasetProvider::from_file(&path)?));
        }
        Ok(provider)
    }
}

/// Number of asset nodes the NRML export produces for a result set.
fn count_assets(result: &[GeoCell]) -> usize {
    result
        .iter()
        .flat_map(|cell| &cell.records)
        .filter(|record| record.buildings > 0.0)
        .count()
}
