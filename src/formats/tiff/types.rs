//! TIFF data structures

use super::ifd::IFD;
use crate::io::ByteOrder;
use std::fmt;

/// Represents a TIFF or BigTIFF file
#[derive(Debug)]
pub struct Tiff {
    /// Byte order declared in the header
    pub byte_order: ByteOrder,
    /// Whether this is BigTIFF format
    pub is_big_tiff: bool,
    /// Image File Directories
    pub ifds: Vec<IFD>,
}

impl Tiff {
    /// Creates a new TIFF structure
    pub fn new(byte_order: ByteOrder, is_big_tiff: bool) -> Self {
        Self {
            byte_order,
            is_big_tiff,
            ifds: Vec::new(),
        }
    }

    /// Adds an IFD to this TIFF
    pub fn add_ifd(&mut self, ifd: IFD) {
        self.ifds.push(ifd);
    }

    /// Returns the main (first) IFD
    pub fn main_ifd(&self) -> Option<&IFD> {
        self.ifds.first()
    }

    /// Returns the number of IFDs
    pub fn ifd_count(&self) -> usize {
        self.ifds.len()
    }
}

impl fmt::Display for Tiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "TIFF File Information:")?;
        writeln!(f, "  Format: {}", if self.is_big_tiff { "BigTIFF" } else { "TIFF" })?;
        writeln!(f, "  Byte order: {:?}", self.byte_order)?;
        writeln!(f, "  Number of IFDs: {}", self.ifds.len())?;

        if let Some(ifd) = self.main_ifd() {
            writeln!(f, "\nMain Image (IFD 0):")?;
            if let Some(dims) = ifd.dimensions() {
                writeln!(f, "  Dimensions: {} x {}", dims.width, dims.height)?;
            }
            writeln!(f, "  Samples per pixel: {}", ifd.samples_per_pixel())?;
            if let Some(bits) = ifd.bits_per_sample() {
                writeln!(f, "  Bits per sample: {}", bits)?;
            }
            match ifd.compression() {
                Ok(compression) => writeln!(f, "  Compression: {}", compression.name())?,
                Err(_) => writeln!(f, "  Compression: unsupported")?,
            }
            writeln!(f, "  Tiled: {}", if ifd.is_tiled() { "Yes" } else { "No" })?;
            if let Some(tile_dims) = ifd.tile_dimensions() {
                writeln!(f, "  Tile size: {} x {}", tile_dims.width, tile_dims.height)?;
            }
            writeln!(f, "  GeoTIFF: {}", if ifd.is_geotiff() { "Yes" } else { "No" })?;

            for tag in ifd.geotiff_tags() {
                writeln!(
                    f,
                    "  Tag {}: {} ({} values)",
                    tag.tag,
                    super::tags::tag_name(tag.tag),
                    tag.count
                )?;
            }
        }

        Ok(())
    }
}
