//! Exposure data model
//!
//! Typed representation of the spatial units handled by the query pipeline:
//! a [`GeoCell`] aggregates building stock for one polygonal area, broken
//! down into one [`TaxonomyRecord`] per building class.
//!
//! The per-cell exposure payload arrives as a loosely-typed JSON
//! sub-document (a column-oriented table, sometimes still string-encoded
//! from its GeoPackage heritage). It is parsed exactly once, at dataset load
//! time; exporters work from the typed records.

mod geocell;
mod payload;

pub use geocell::{to_multi_polygon, GeoCell};
pub use payload::{parse_payload, PayloadError, TaxonomyRecord, DEFAULT_DAMAGE_STATE};
