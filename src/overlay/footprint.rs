//! Geographic footprint of a raster
//!
//! The footprint is a flat approximation: the raster's extent in meters is
//! converted to degrees with a fixed meters-per-degree factor and centered on
//! a caller-supplied coordinate. Longitude degrees shrink with the cosine of
//! the center latitude.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::{Dimensions, Resolution};

/// Meters covered by one degree of latitude
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Axis-aligned bounding rectangle in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoFootprint {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

/// Checks that a center coordinate can anchor a footprint.
///
/// Both values must be finite, latitude in [-90, 90] and longitude in
/// [-180, 180]. The poles are rejected because the longitude span divides by
/// `cos(lat)`.
pub fn validate_center(lat: f64, lng: f64) -> Result<()> {
    if !lat.is_finite() || !lng.is_finite() {
        return Err(Error::InputRange(format!(
            "center ({}, {}) is not a finite coordinate",
            lat, lng
        )));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(Error::InputRange(format!("latitude {} outside [-90, 90]", lat)));
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err(Error::InputRange(format!("longitude {} outside [-180, 180]", lng)));
    }
    if lat.abs() >= 90.0 || lat.to_radians().cos() <= 0.0 {
        return Err(Error::InputRange(format!(
            "latitude {} is a pole; longitude span is undefined",
            lat
        )));
    }
    Ok(())
}

impl GeoFootprint {
    /// Computes the footprint of a `dimensions` raster with the given pixel
    /// size in meters, centered on `(lat, lng)`.
    pub fn from_resolution(
        dimensions: Dimensions,
        resolution: Resolution,
        lat: f64,
        lng: f64,
    ) -> Result<Self> {
        validate_center(lat, lng)?;

        let width_meters = dimensions.width as f64 * resolution.x.abs();
        let height_meters = dimensions.height as f64 * resolution.y.abs();

        let lat_span = height_meters / METERS_PER_DEGREE;
        let lng_span = width_meters / (METERS_PER_DEGREE * lat.to_radians().cos());

        Ok(Self {
            north: lat + lat_span / 2.0,
            south: lat - lat_span / 2.0,
            east: lng + lng_span / 2.0,
            west: lng - lng_span / 2.0,
        })
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }

    /// Center as `(lat, lng)`
    pub fn center(&self) -> (f64, f64) {
        ((self.north + self.south) / 2.0, (self.east + self.west) / 2.0)
    }
}
