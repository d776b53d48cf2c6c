//! Raster to overlay conversion
//!
//! Validates the center, decodes the raster, then runs the footprint, range
//! scan, color mapping and PNG stages in order. Each call is independent.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::{debug, info};

use super::colormap::colorize;
use super::footprint::{validate_center, GeoFootprint};
use super::png::encode_rgba;
use super::range::ValueRange;
use crate::error::{Error, Result};
use crate::io::source::{map_file, RasterSource, DEFAULT_MAX_RASTER_BYTES};
use crate::raster::Raster;

/// A color-mapped raster ready to be placed on a web map
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayImage {
    /// Bounding rectangle in degrees
    pub rectangle: GeoFootprint,
    /// PNG file bytes
    pub image: Vec<u8>,
    pub width: usize,
    pub height: usize,
    /// Largest non-sentinel sample
    pub max: f64,
    /// Smallest non-sentinel sample
    pub min: f64,
}

impl OverlayImage {
    /// Range the ramp was built over, for recovering values from pixels
    pub fn range(&self) -> ValueRange {
        ValueRange::new(self.min, self.max)
    }

    /// The PNG as a `data:image/png;base64,` URI
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", STANDARD.encode(&self.image))
    }
}

/// Converts an already decoded raster
pub fn convert_raster(raster: &Raster, lat: f64, lng: f64) -> Result<OverlayImage> {
    let info = raster.info();
    let rectangle = GeoFootprint::from_resolution(info.dimensions, info.resolution, lat, lng)?;
    debug!(
        north = rectangle.north,
        south = rectangle.south,
        east = rectangle.east,
        west = rectangle.west,
        "Computed footprint"
    );

    let range = ValueRange::scan(raster.samples()).ok_or(Error::NoData {
        width: raster.width(),
        height: raster.height(),
    })?;
    debug!(min = range.min, max = range.max, "Scanned value range");

    let pixels = colorize(raster.samples(), &range);
    let image = encode_rgba(&pixels, raster.width(), raster.height())?;
    info!(
        width = raster.width(),
        height = raster.height(),
        png_bytes = image.len(),
        "Encoded overlay"
    );

    Ok(OverlayImage {
        rectangle,
        image,
        width: raster.width(),
        height: raster.height(),
        max: range.max,
        min: range.min,
    })
}

/// Converts TIFF bytes held in memory
pub fn convert_bytes(data: &[u8], lat: f64, lng: f64) -> Result<OverlayImage> {
    validate_center(lat, lng)?;
    let raster = Raster::decode(data)?;
    convert_raster(&raster, lat, lng)
}

/// Converts a local TIFF file
pub fn convert_path<P: AsRef<Path>>(path: P, lat: f64, lng: f64) -> Result<OverlayImage> {
    validate_center(lat, lng)?;
    let data = map_file(path)?;
    convert_bytes(&data, lat, lng)
}

/// Fetches a TIFF over HTTP(S) and converts it
pub async fn convert_url(url: &str, lat: f64, lng: f64) -> Result<OverlayImage> {
    convert(RasterSource::Url(url.to_string()), lat, lng).await
}

/// Converts a raster from any source with a default HTTP client
pub async fn convert(source: RasterSource, lat: f64, lng: f64) -> Result<OverlayImage> {
    convert_with_client(&reqwest::Client::new(), source, lat, lng).await
}

/// Converts a raster from any source, fetching URLs with `client`.
/// Downloads are capped at [`DEFAULT_MAX_RASTER_BYTES`].
pub async fn convert_with_client(
    client: &reqwest::Client,
    source: RasterSource,
    lat: f64,
    lng: f64,
) -> Result<OverlayImage> {
    validate_center(lat, lng)?;
    let data = source.load(client, DEFAULT_MAX_RASTER_BYTES).await?;
    convert_bytes(&data, lat, lng)
}
