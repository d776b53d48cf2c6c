//! TIFF and BigTIFF format support

pub mod geotiff;
pub mod ifd;
pub mod reader;
pub mod tags;
pub mod types;

pub use geotiff::GeoInfo;
pub use ifd::{IFDEntry, TagValue, IFD};
pub use reader::TiffReader;
pub use types::Tiff;

/// TIFF magic number (42)
pub const TIFF_MAGIC: u16 = 42;

/// BigTIFF magic number (43)
pub const BIGTIFF_MAGIC: u16 = 43;
