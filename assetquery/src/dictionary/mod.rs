//! Taxonomy property dictionary
//!
//! Tabular lookup from taxonomy code to per-building-class properties,
//! loaded from the schema's `<schema>_dict.csv` file (header row
//! `btype,avg_struct_cost,nocc_day,nocc_night`).
//!
//! Keys are required to be unique at load time; a duplicate code is a
//! load-time error rather than a silently-resolved first match.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors that can occur while loading the property dictionary.
#[derive(Debug, Error)]
pub enum DictionaryError {
    /// Dictionary file could not be read or parsed
    #[error("failed to read dictionary '{}': {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A taxonomy code appears more than once
    #[error("duplicate taxonomy code '{btype}' in dictionary '{}'", path.display())]
    DuplicateKey { path: PathBuf, btype: String },
}

/// Properties of one building class.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaxonomyProperty {
    /// Taxonomy code (building type)
    pub btype: String,
    /// Average structural replacement cost per building
    pub avg_struct_cost: f64,
    /// Average number of occupants during the day
    pub nocc_day: f64,
    /// Average number of occupants during the night
    pub nocc_night: f64,
}

/// Lookup table from taxonomy code to building-class properties.
#[derive(Debug, Clone, Default)]
pub struct PropertyDictionary {
    properties: HashMap<String, TaxonomyProperty>,
}

impl PropertyDictionary {
    /// Loads the dictionary from a CSV file.
    ///
    /// # Errors
    ///
    /// Returns [`DictionaryError::Csv`] for unreadable or malformed input
    /// and [`DictionaryError::DuplicateKey`] when a taxonomy code repeats.
    pub fn from_file(path: &Path) -> Result<Self, DictionaryError> {
        let mut reader = csv::Reader::from_path(path).map_err(|source| DictionaryError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

        let mut properties = HashMap::new();
        for row in reader.deserialize() {
            let property: TaxonomyProperty = row.map_err(|source| DictionaryError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            if properties
                .insert(property.btype.clone(), property.clone())
                .is_some()
            {
                return Err(DictionaryError::DuplicateKey {
                    path: path.to_path_buf(),
                    btype: property.btype,
                });
            }
        }

        debug!(path = %path.display(), codes = properties.len(), "loaded property dictionary");
        Ok(Self { properties })
    }

    /// Builds a dictionary from rows, rejecting duplicate codes.
    pub fn from_rows(rows: Vec<TaxonomyProperty>) -> Result<Self, DictionaryError> {
        let mut properties = HashMap::new();
        for property in rows {
            if properties
                .insert(property.btype.clone(), property.clone())
                .is_some()
            {
                return Err(DictionaryError::DuplicateKey {
                    path: PathBuf::new(),
                    btype: property.btype,
                });
            }
        }
        Ok(Self { properties })
    }

    /// Looks up the properties of a taxonomy code.
    pub fn lookup(&self, btype: &str) -> Option<&TaxonomyProperty> {
        self.properties.get(btype)
    }

    /// Returns the codes from `codes` that are absent from the dictionary,
    /// in input order.
    ///
    /// Used to verify the metadata's taxonomy list is a subset of the
    /// dictionary before any spatial query runs.
    pub fn missing_codes<'a>(&self, codes: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        codes
            .into_iter()
            .filter(|code| !self.properties.contains_key(*code))
            .map(str::to_string)
            .collect()
    }

    /// Number of taxonomy codes in the dictionary.
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the dictionary is empty.
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_csv(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dict.csv");
        fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    fn test_load_and_lookup() {
        let (_dir, path) = write_csv(
            "btype,avg_struct_cost,nocc_day,nocc_night\n\
             MUR,1000.0,2.5,4.0\n\
             CR-LFM,25000.0,3.0,5.5\n",
        );
        let dict = PropertyDictionary::from_file(&path).unwrap();
        assert_eq!(dict.len(), 2);

        let mur = dict.lookup("MUR").unwrap();
        assert_eq!(mur.avg_struct_cost, 1000.0);
        assert_eq!(mur.nocc_day, 2.5);
        assert_eq!(mur.nocc_night, 4.0);

        assert!(dict.lookup("W-WLI").is_none());
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let (_dir, path) = write_csv(
            "btype,avg_struct_cost,nocc_day,nocc_night\n\
             MUR,1000.0,2.5,4.0\n\
             MUR,2000.0,1.0,1.0\n",
        );
        let err = PropertyDictionary::from_file(&path).unwrap_err();
        assert!(matches!(err, DictionaryError::DuplicateKey { btype, .. } if btype == "MUR"));
    }

    #[test]
    fn test_missing_codes() {
        let dict = PropertyDictionary::from_rows(vec![TaxonomyProperty {
            btype: "T1".into(),
            avg_struct_cost: 1.0,
            nocc_day: 0.0,
            nocc_night: 0.0,
        }])
        .unwrap();
        assert!(dict.missing_codes(["T1"]).is_empty());
        assert_eq!(dict.missing_codes(["T1", "T2", "T3"]), vec!["T2", "T3"]);
    }

    #[test]
    fn test_malformed_row() {
        let (_dir, path) = write_csv(
            "btype,avg_struct_cost,nocc_day,nocc_night\n\
             MUR,not-a-number,2.5,4.0\n",
        );
        assert!(matches!(
            PropertyDictionary::from_file(&path).unwrap_err(),
            DictionaryError::Csv { .. }
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = PropertyDictionary::from_file(Path::new("/nonexistent/dict.csv")).unwrap_err();
        assert!(matches!(err, DictionaryError::Csv { .. }));
    }
}
