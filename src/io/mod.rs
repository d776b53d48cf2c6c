//! I/O utilities for firemap-rasterizer
//!
//! Byte order handling for the TIFF decoder and resolution of raster sources
//! to raw bytes.

pub mod byte_order;
pub mod source;

pub use byte_order::ByteOrder;
pub use source::{RasterData, RasterSource};
