//! Spatial model providers
//!
//! This module provides the capability trait and implementations for
//! answering spatial predicates against exposure datasets.
//!
//! # Composite Pattern
//!
//! A [`DatasetProvider`] wraps a single dataset file; a
//! [`MultiModelProvider`] composes several providers (typically one per file
//! in a schema directory) behind the same [`SpatialQuery`] interface:
//!
//! ```ignore
//! use assetquery::provider::{DatasetProvider, MultiModelProvider, SpatialQuery};
//!
//! let mut multi = MultiModelProvider::new();
//! multi.push(Box::new(DatasetProvider::from_file(&path)?));
//! let cells = multi.within(&roi);
//! ```

mod composite;
mod dataset;
mod types;

pub use composite::MultiModelProvider;
pub use dataset::DatasetProvider;
pub use types::{DatasetError, QueryResult, SpatialQuery};
