//! AssetQuery - Spatial query and export of building-exposure models
//!
//! This library answers one question: given a rectangular geographic region
//! and a named exposure schema, which geocells match a spatial predicate,
//! and how do they serialize to GeoJSON and NRML?
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified facade:
//!
//! ```ignore
//! use assetquery::config::{QueryConfig, QueryMode};
//! use assetquery::roi::RegionOfInterest;
//! use assetquery::service::QueryService;
//!
//! let roi = RegionOfInterest::new(-71.8, -71.4, -33.2, -33.0)?;
//! let config = QueryConfig::new("schemas", "SARA_v1.0", "res", QueryMode::Intersects, "output");
//! let report = QueryService::new(config).run(&roi)?;
//! println!("{} geocells matched", report.matched);
//! ```

pub mod config;
pub mod dictionary;
pub mod export;
pub mod logging;
pub mod metadata;
pub mod model;
pub mod provider;
pub mod roi;
pub mod service;

/// Version of the AssetQuery library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
