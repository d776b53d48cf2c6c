//! GeoTIFF specific functionality

use super::ifd::IFD;
use super::tags;
use crate::error::{Error, Result};
use crate::types::Resolution;

/// GeoTIFF information extracted from an IFD
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoInfo {
    /// Model pixel scale (ScaleX, ScaleY, ScaleZ)
    pub pixel_scale: Option<(f64, f64, f64)>,
    /// Model tiepoint (pixel coord -> geo coord mapping)
    pub tiepoints: Vec<TiePoint>,
    /// Row-major 4x4 model transformation (if available)
    pub transform: Option<[f64; 16]>,
    /// EPSG code if detected
    pub epsg_code: Option<u16>,
    /// Citation from GeoAsciiParams
    pub citation: Option<String>,
    /// GDAL_NODATA value as written by the producer
    pub nodata: Option<String>,
}

/// Represents a GeoTIFF tiepoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiePoint {
    pub pixel_x: f64,
    pub pixel_y: f64,
    pub pixel_z: f64,
    pub geo_x: f64,
    pub geo_y: f64,
    pub geo_z: f64,
}

/// GeoKey constants
mod geo_keys {
    pub const GEOGRAPHIC_TYPE: u16 = 2048;
    pub const PROJECTED_CS_TYPE: u16 = 3072;
    /// Values at or above this are "user-defined", not EPSG codes
    pub const USER_DEFINED: u16 = 32767;
}

impl GeoInfo {
    /// Extracts GeoTIFF information from an IFD
    pub fn from_ifd(ifd: &IFD) -> Self {
        let mut geo_info = GeoInfo::default();

        if let Some(values) = ifd.get_f64s(tags::MODEL_PIXEL_SCALE) {
            if values.len() >= 3 {
                geo_info.pixel_scale = Some((values[0], values[1], values[2]));
            }
        }

        if let Some(values) = ifd.get_f64s(tags::MODEL_TIEPOINT) {
            geo_info.tiepoints = values
                .chunks_exact(6)
                .map(|chunk| TiePoint {
                    pixel_x: chunk[0],
                    pixel_y: chunk[1],
                    pixel_z: chunk[2],
                    geo_x: chunk[3],
                    geo_y: chunk[4],
                    geo_z: chunk[5],
                })
                .collect();
        }

        if let Some(values) = ifd.get_f64s(tags::MODEL_TRANSFORMATION) {
            if values.len() >= 16 {
                let mut matrix = [0.0; 16];
                matrix.copy_from_slice(&values[..16]);
                geo_info.transform = Some(matrix);
            }
        }

        if let Some(keys) = ifd.get_u64s(tags::GEO_KEY_DIRECTORY) {
            geo_info.epsg_code = epsg_from_keys(&keys);
        }

        if let Some(ascii) = ifd.get_ascii(tags::GEO_ASCII_PARAMS) {
            let citation = ascii.trim_end_matches('|').trim();
            if !citation.is_empty() {
                geo_info.citation = Some(citation.to_string());
            }
        }

        if let Some(nodata) = ifd.get_ascii(tags::GDAL_NODATA) {
            let nodata = nodata.trim();
            if !nodata.is_empty() {
                geo_info.nodata = Some(nodata.to_string());
            }
        }

        geo_info
    }

    /// Returns the pixel resolution `(x, y, z)`.
    ///
    /// ModelPixelScale yields `(sx, -sy, sz)`. Without it, the resolution is
    /// taken from the ModelTransformation matrix, accounting for rotation
    /// terms when present.
    pub fn resolution(&self) -> Result<Resolution> {
        let resolution = if let Some((sx, sy, sz)) = self.pixel_scale {
            Resolution::new(sx, -sy, sz)
        } else if let Some(t) = self.transform {
            if t[1] == 0.0 && t[4] == 0.0 {
                Resolution::new(t[0], -t[5], t[10])
            } else {
                Resolution::new(
                    (t[0] * t[0] + t[4] * t[4]).sqrt(),
                    -(t[1] * t[1] + t[5] * t[5]).sqrt(),
                    t[10],
                )
            }
        } else {
            return Err(Error::MissingResolution);
        };

        let usable = |v: f64| v.is_finite() && v != 0.0;
        if !usable(resolution.x) || !usable(resolution.y) {
            return Err(Error::InvalidFormat(format!(
                "Unusable pixel resolution {} x {}",
                resolution.x, resolution.y
            )));
        }

        Ok(resolution)
    }

    /// Model coordinates of the upper-left corner of pixel (0, 0)
    pub fn origin(&self) -> Option<(f64, f64)> {
        if let (Some((sx, sy, _)), Some(tp)) = (self.pixel_scale, self.tiepoints.first()) {
            return Some((tp.geo_x - tp.pixel_x * sx, tp.geo_y + tp.pixel_y * sy));
        }
        self.transform.map(|t| (t[3], t[7]))
    }
}

/// Scans the key directory (header of 4 shorts, then 4 shorts per key) for
/// a geographic or projected CRS code stored directly in the key.
fn epsg_from_keys(keys: &[u64]) -> Option<u16> {
    if keys.len() < 4 {
        return None;
    }

    let num_keys = keys[3] as usize;
    let mut geographic = None;
    let mut projected = None;

    for key in keys[4..].chunks_exact(4).take(num_keys) {
        let (key_id, location, value) = (key[0], key[1], key[3]);
        if location != 0 || value == 0 || value >= geo_keys::USER_DEFINED as u64 {
            continue;
        }

        match key_id as u16 {
            geo_keys::GEOGRAPHIC_TYPE => geographic = Some(value as u16),
            geo_keys::PROJECTED_CS_TYPE => projected = Some(value as u16),
            _ => {}
        }
    }

    projected.or(geographic)
}

impl std::fmt::Display for GeoInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "GeoTIFF Information:")?;

        if let Some(epsg) = self.epsg_code {
            writeln!(f, "  EPSG Code: {}", epsg)?;
        }

        if let Some(ref name) = self.citation {
            writeln!(f, "  Citation: {}", name)?;
        }

        if let Some((sx, sy, _sz)) = self.pixel_scale {
            writeln!(f, "  Pixel Size: {} x {}", sx, sy)?;
        }

        if let Some((x, y)) = self.origin() {
            writeln!(f, "  Origin (model): ({}, {})", x, y)?;
        }

        if let Some(ref nodata) = self.nodata {
            writeln!(f, "  NoData: {}", nodata)?;
        }

        Ok(())
    }
}
