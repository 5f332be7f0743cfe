//! Exposure model metadata
//!
//! Descriptive metadata for an exposure model, loaded from the schema's
//! `<schema>_meta.json` file. The structural cost declaration is mandatory;
//! nonstructural/contents declarations and the insurance flags are optional
//! and written as JSON `false` when absent (a convention inherited from the
//! upstream metadata files, preserved here on input).

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use thiserror::Error;

/// Mandatory top-level metadata keys.
const REQUIRED_KEYS: [&str; 7] = [
    "id",
    "category",
    "taxonomy_source",
    "description",
    "structural_cost_aggregation_type",
    "structural_cost_currency",
    "taxonomies",
];

/// Errors that can occur while loading exposure metadata.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Metadata file could not be read
    #[error("failed to read metadata file '{}': {source}", path.display())]
    Read {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Metadata file is not valid JSON
    #[error("failed to parse metadata: {0}")]
    Json(#[from] serde_json::Error),

    /// Metadata document is not a JSON object
    #[error("metadata document must be a JSON object")]
    NotAnObject,

    /// A mandatory key is absent
    #[error("metadata is missing mandatory key '{0}'")]
    MissingKey(String),

    /// A key holds a value of the wrong type
    #[error("metadata key '{key}' has an invalid value: {reason}")]
    InvalidValue { key: String, reason: String },
}

/// Cost-type declaration for one cost category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostDeclaration {
    /// Aggregation type (e.g. `per_asset`)
    pub aggregation_type: String,
    /// Currency unit (e.g. `USD`)
    pub currency: String,
}

/// Descriptive metadata of an exposure model.
#[derive(Debug, Clone, PartialEq)]
pub struct ExposureMetadata {
    /// Model id (e.g. `SARA_v1.0`)
    pub id: String,
    /// Asset category (e.g. `buildings`)
    pub category: String,
    /// Label of the taxonomy scheme in use
    pub taxonomy_source: String,
    /// Free-text description
    pub description: String,
    /// Mandatory structural cost declaration
    pub structural: CostDeclaration,
    /// Optional nonstructural cost declaration
    pub nonstructural: Option<CostDeclaration>,
    /// Optional contents cost declaration
    pub contents: Option<CostDeclaration>,
    /// Insurance deductible "is absolute" flag, when declared
    pub deductible_is_absolute: Option<bool>,
    /// Insurance limit "is absolute" flag, when declared
    pub insurance_limit_is_absolute: Option<bool>,
    /// Ordered list of taxonomy codes present in the model
    pub taxonomies: Vec<String>,
}

impl ExposureMetadata {
    /// Loads metadata from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, MetadataError> {
        let contents = fs::read_to_string(path).map_err(|source| MetadataError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&contents)?;
        Self::from_value(&value)
    }

    /// Builds metadata from a parsed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::MissingKey`] when any mandatory key is
    /// absent, including the currency of an optional cost category that
    /// declares an aggregation type.
    pub fn from_value(value: &Value) -> Result<Self, MetadataError> {
        let map = value.as_object().ok_or(MetadataError::NotAnObject)?;

        for key in REQUIRED_KEYS {
            if !map.contains_key(key) {
                return Err(MetadataError::MissingKey(key.to_string()));
            }
        }

        Ok(Self {
            id: get_string(map, "id")?,
            category: get_string(map, "category")?,
            taxonomy_source: get_string(map, "taxonomy_source")?,
            description: get_string(map, "description")?,
            structural: CostDeclaration {
                aggregation_type: get_string(map, "structural_cost_aggregation_type")?,
                currency: get_string(map, "structural_cost_currency")?,
            },
            nonstructural: optional_cost(map, "nonstructural")?,
            contents: optional_cost(map, "contents")?,
            deductible_is_absolute: optional_flag(map, "insurance_deductible_is_absolute")?,
            insurance_limit_is_absolute: optional_flag(map, "insurance_limit_is_absolute")?,
            taxonomies: get_string_list(map, "taxonomies")?,
        })
    }
}

fn get_string(map: &Map<String, Value>, key: &str) -> Result<String, MetadataError> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(MetadataError::InvalidValue {
            key: key.to_string(),
            reason: "expected a string".to_string(),
        }),
        None => Err(MetadataError::MissingKey(key.to_string())),
    }
}

fn get_string_list(map: &Map<String, Value>, key: &str) -> Result<Vec<String>, MetadataError> {
    let invalid = || MetadataError::InvalidValue {
        key: key.to_string(),
        reason: "expected a list of strings".to_string(),
    };
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
        None => Err(MetadataError::MissingKey(key.to_string())),
    }
}

/// Reads an optional cost category declared by
/// `<prefix>_cost_aggregation_type`.
///
/// JSON `false` (and an empty string) means "not declared". A declared
/// aggregation type makes the matching `<prefix>_cost_currency` mandatory.
fn optional_cost(
    map: &Map<String, Value>,
    prefix: &str,
) -> Result<Option<CostDeclaration>, MetadataError> {
    let type_key = format!("{prefix}_cost_aggregation_type");
    let aggregation_type = match map.get(type_key.as_str()) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(None),
        Some(Value::String(s)) if s.is_empty() => return Ok(None),
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            return Err(MetadataError::InvalidValue {
                key: type_key,
                reason: "expected a string or false".to_string(),
            })
        }
    };

    let currency_key = format!("{prefix}_cost_currency");
    let currency = match map.get(currency_key.as_str()) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Null) | None => return Err(MetadataError::MissingKey(currency_key)),
        Some(_) => {
            return Err(MetadataError::InvalidValue {
                key: currency_key,
                reason: "expected a non-empty string".to_string(),
            })
        }
    };

    Ok(Some(CostDeclaration {
        aggregation_type,
        currency,
    }))
}

/// Reads a tri-state insurance flag.
///
/// JSON `false` means "not declared"; a string is parsed as a boolean
/// literal case-insensitively (upstream files carry `"False"`/`"True"`).
fn optional_flag(map: &Map<String, Value>, key: &str) -> Result<Option<bool>, MetadataError> {
    match map.get(key) {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Ok(None),
        Some(Value::Bool(true)) => Ok(Some(true)),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => match s.to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(MetadataError::InvalidValue {
                key: key.to_string(),
                reason: format!("'{s}' is not a boolean literal"),
            }),
        },
        Some(_) => Err(MetadataError::InvalidValue {
            key: key.to_string(),
            reason: "expected a boolean literal or false".to_string(),
        }),
    }
}
