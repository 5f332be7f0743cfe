//! Region-of-interest type definitions

use geo::{LineString, Polygon};
use thiserror::Error;

use super::normalize_longitude;

/// Errors that can occur when constructing a region of interest.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    /// Longitude bounds are inverted or collapsed after normalization
    #[error("invalid longitude range: lonmin {lonmin} must be less than lonmax {lonmax}")]
    InvalidLongitudeRange { lonmin: f64, lonmax: f64 },

    /// Latitude bounds are inverted or collapsed
    #[error("invalid latitude range: latmin {latmin} must be less than latmax {latmax}")]
    InvalidLatitudeRange { latmin: f64, latmax: f64 },
}

/// An axis-aligned query rectangle in EPSG:4326.
///
/// The rectangle is represented as a closed 5-point polygon ring so that it
/// can be handed directly to the spatial predicates. Construction validates
/// the bounds: an inverted or collapsed rectangle would otherwise silently
/// produce a self-intersecting or empty polygon downstream.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionOfInterest {
    lonmin: f64,
    lonmax: f64,
    latmin: f64,
    latmax: f64,
    polygon: Polygon<f64>,
}

impl RegionOfInterest {
    /// Builds the query rectangle from its bounds.
    ///
    /// Longitude bounds are normalized from the 0..360 convention first
    /// (latitudes are never normalized), then the rectangle is validated.
    ///
    /// # Errors
    ///
    /// Returns [`RegionError`] if `lonmin >= lonmax` after normalization or
    /// `latmin >= latmax`.
    pub fn new(lonmin: f64, lonmax: f64, latmin: f64, latmax: f64) -> Result<Self, RegionError> {
        let lonmin = normalize_longitude(lonmin);
        let lonmax = normalize_longitude(lonmax);

        if lonmin >= lonmax {
            return Err(RegionError::InvalidLongitudeRange { lonmin, lonmax });
        }
        if latmin >= latmax {
            return Err(RegionError::InvalidLatitudeRange { latmin, latmax });
        }

        // Closed ring, counter-clockwise from the south-west corner.
        let ring = LineString::from(vec![
            (lonmin, latmin),
            (lonmin, latmax),
            (lonmax, latmax),
            (lonmax, latmin),
            (lonmin, latmin),
        ]);

        Ok(Self {
            lonmin,
            lonmax,
            latmin,
            latmax,
            polygon: Polygon::new(ring, vec![]),
        })
    }

    /// The rectangle as a polygon for spatial predicates.
    pub fn polygon(&self) -> &Polygon<f64> {
        &self.polygon
    }

    /// Normalized bounds as `(lonmin, lonmax, latmin, latmax)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (self.lonmin, self.lonmax, self.latmin, self.latmax)
    }
}
