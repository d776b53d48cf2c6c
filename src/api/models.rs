use serde::{Deserialize, Serialize};

use crate::overlay::{ForecastUnit, GeoFootprint, OverlayImage};

/// Query of `GET /api/tif`. Fields stay optional so missing values map to
/// 400 responses instead of extractor rejections.
#[derive(Debug, Default, Deserialize)]
pub struct TifQuery {
    pub url: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TifResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub data: OverlayPayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OverlayPayload {
    /// PNG as a data URI
    pub data: String,
    pub bbox: GeoFootprint,
    pub width: usize,
    pub height: usize,
    pub max: f64,
    pub min: f64,
    pub unit: ForecastUnit,
}

impl OverlayPayload {
    pub fn new(overlay: &OverlayImage, unit: ForecastUnit) -> Self {
        Self {
            data: overlay.data_uri(),
            bbox: overlay.rectangle,
            width: overlay.width,
            height: overlay.height,
            max: overlay.max,
            min: overlay.min,
            unit,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
