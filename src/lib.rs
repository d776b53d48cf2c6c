//! firemap-rasterizer - wildfire forecast rasters as web map overlays
//!
//! firemap-rasterizer decodes a single-band (Geo)TIFF forecast layer, places
//! it on the map around a center coordinate and renders it as an RGBA PNG
//! whose red channel encodes the sample value on an inverse ramp between the
//! raster's minimum and maximum.
//!
//! # Examples
//!
//! ## Converting a local file
//!
//! ```no_run
//! use firemap_rasterizer::overlay::convert_path;
//!
//! let overlay = convert_path("flame-length.tif", 45.0, -120.0)?;
//! println!("{}x{} PNG, {} bytes", overlay.width, overlay.height, overlay.image.len());
//! println!("north {} south {}", overlay.rectangle.north, overlay.rectangle.south);
//! # Ok::<(), firemap_rasterizer::Error>(())
//! ```
//!
//! ## Recovering values from the overlay
//!
//! ```no_run
//! use firemap_rasterizer::overlay::{convert_bytes, ForecastUnit};
//!
//! let tiff = std::fs::read("hours-since-burned.tif")?;
//! let overlay = convert_bytes(&tiff, 38.5, -121.5)?;
//!
//! let unit = ForecastUnit::from_path("hours-since-burned.tif");
//! let value = overlay.range().value_from_red(128);
//! println!("{}", unit.format_value(value));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod api;
pub mod compression;
pub mod config;
pub mod error;
pub mod formats;
pub mod io;
pub mod overlay;
pub mod raster;
pub mod types;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use formats::tiff::{tags, GeoInfo, IFDEntry, Tiff, TiffReader, BIGTIFF_MAGIC, IFD, TIFF_MAGIC};
pub use io::{ByteOrder, RasterSource};
pub use overlay::{ForecastUnit, GeoFootprint, OverlayImage, ValueRange};
pub use raster::{Raster, RasterInfo};
pub use types::{DataType, Dimensions, Resolution};
