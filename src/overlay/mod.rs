//! Overlay pipeline: footprint, value range, color mapping and PNG encoding

pub mod colormap;
pub mod convert;
pub mod footprint;
pub mod png;
pub mod range;
pub mod units;

pub use colormap::{colorize, ramp_pixel};
pub use convert::{
    convert, convert_bytes, convert_path, convert_raster, convert_url, convert_with_client,
    OverlayImage,
};
pub use footprint::{validate_center, GeoFootprint, METERS_PER_DEGREE};
pub use png::encode_rgba;
pub use range::{is_sentinel, ValueRange};
pub use units::ForecastUnit;
