//! Strip and tile assembly
//!
//! Both layouts are handled as a grid of chunks: strips are chunks as wide as
//! the image, tiles are fixed-size chunks that may overhang the right and
//! bottom edges. Chunks are decompressed in parallel and then copied into a
//! row-major band of f64 samples.

use rayon::prelude::*;
use tracing::debug;

use super::samples::read_sample;
use super::tags::TagReader;
use crate::compression::{Compression, Predictor};
use crate::error::{Error, Result};
use crate::formats::tiff::ifd::IFD;
use crate::formats::tiff::tags;
use crate::io::ByteOrder;
use crate::types::{DataType, Dimensions};

/// Largest band decoded, in pixels
pub const MAX_PIXELS: usize = 1 << 28;
/// Largest decoded size of one strip or tile
pub const MAX_CHUNK_BYTES: usize = 256 << 20;
/// Largest total decoded size of all chunks of a band
pub const MAX_DECODED_BYTES: u64 = 4 << 30;
/// Tile edges may exceed the image edge only up to this length
const MAX_OVERHANGING_TILE_EDGE: usize = 4096;

/// Geometry and codec parameters of the first band of an image
#[derive(Debug, Clone)]
pub struct ChunkLayout {
    pub image: Dimensions,
    pub chunk_width: usize,
    pub chunk_height: usize,
    pub chunks_across: usize,
    pub chunks_down: usize,
    /// Samples interleaved per pixel inside a chunk (1 for planar images)
    pub samples_per_pixel: usize,
    pub data_type: DataType,
    pub compression: Compression,
    pub predictor: Predictor,
    pub tiled: bool,
    pub offsets: Vec<u64>,
    pub byte_counts: Vec<u64>,
}

impl ChunkLayout {
    /// Resolves the layout of band 1 from the directory tags
    pub fn from_ifd(ifd: &IFD) -> Result<Self> {
        let image = ifd
            .dimensions()
            .ok_or(Error::MissingTag(tags::IMAGE_WIDTH))?;
        if image.is_empty() {
            return Err(Error::InvalidFormat(format!(
                "Image has zero dimensions {}x{}",
                image.width, image.height
            )));
        }
        let pixels = image
            .width
            .checked_mul(image.height)
            .ok_or_else(|| Error::InvalidFormat("Image dimensions overflow".to_string()))?;
        if pixels > MAX_PIXELS {
            return Err(Error::Unsupported(format!(
                "{}x{} image exceeds {} pixels",
                image.width, image.height, MAX_PIXELS
            )));
        }

        let data_type = ifd.data_type()?;
        let compression = ifd.compression()?;
        let predictor = ifd.predictor()?;

        let samples_per_pixel = ifd.samples_per_pixel().max(1) as usize;
        let planar = match ifd.planar_configuration() {
            1 => false,
            2 => true,
            other => {
                return Err(Error::Unsupported(format!("Planar configuration {}", other)))
            }
        };

        let tiled = ifd.is_tiled();
        let (chunk_width, chunk_height, offsets_tag, counts_tag) = if tiled {
            let tile = ifd
                .tile_dimensions()
                .ok_or(Error::MissingTag(tags::TILE_LENGTH))?;
            if tile.width > image.width.max(MAX_OVERHANGING_TILE_EDGE)
                || tile.height > image.height.max(MAX_OVERHANGING_TILE_EDGE)
            {
                return Err(Error::InvalidFormat(format!(
                    "{}x{} tiles do not fit a {}x{} image",
                    tile.width, tile.height, image.width, image.height
                )));
            }
            (tile.width, tile.height, tags::TILE_OFFSETS, tags::TILE_BYTE_COUNTS)
        } else {
            let rows = ifd
                .rows_per_strip()
                .ok_or(Error::MissingTag(tags::ROWS_PER_STRIP))?;
            let rows = (rows as usize).min(image.height);
            (image.width, rows, tags::STRIP_OFFSETS, tags::STRIP_BYTE_COUNTS)
        };

        if chunk_width == 0 || chunk_height == 0 {
            return Err(Error::InvalidFormat(format!(
                "Chunk size {}x{} is empty",
                chunk_width, chunk_height
            )));
        }

        let samples_per_pixel = if planar { 1 } else { samples_per_pixel };
        let chunk_bytes = chunk_width
            .checked_mul(chunk_height)
            .and_then(|n| n.checked_mul(samples_per_pixel))
            .and_then(|n| n.checked_mul(data_type.size()))
            .ok_or_else(|| {
                Error::InvalidFormat(format!(
                    "{}x{} chunk of {} samples overflows",
                    chunk_width, chunk_height, samples_per_pixel
                ))
            })?;
        if chunk_bytes > MAX_CHUNK_BYTES {
            return Err(Error::Unsupported(format!(
                "Chunk of {} bytes exceeds {} bytes",
                chunk_bytes, MAX_CHUNK_BYTES
            )));
        }

        let chunks_across = image.width.div_ceil(chunk_width);
        let chunks_down = image.height.div_ceil(chunk_height);
        let chunks_per_plane = chunks_across * chunks_down;
        let decoded_bytes = (chunks_per_plane as u64).saturating_mul(chunk_bytes as u64);
        if decoded_bytes > MAX_DECODED_BYTES {
            return Err(Error::Unsupported(format!(
                "Band decodes to {} bytes, limit is {}",
                decoded_bytes, MAX_DECODED_BYTES
            )));
        }

        let mut offsets = ifd.require_u64s(offsets_tag)?;
        let mut byte_counts = ifd.require_u64s(counts_tag)?;
        if offsets.len() < chunks_per_plane || byte_counts.len() < chunks_per_plane {
            return Err(Error::InvalidFormat(format!(
                "Expected {} chunks, found {} offsets and {} byte counts",
                chunks_per_plane,
                offsets.len(),
                byte_counts.len()
            )));
        }

        // Band 1 is the first plane of a planar image
        offsets.truncate(chunks_per_plane);
        byte_counts.truncate(chunks_per_plane);

        Ok(Self {
            image,
            chunk_width,
            chunk_height,
            chunks_across,
            chunks_down,
            samples_per_pixel,
            data_type,
            compression,
            predictor,
            tiled,
            offsets,
            byte_counts,
        })
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks_across * self.chunks_down
    }

    /// Rows stored in a chunk. The last strip may be shorter; tiles are
    /// always full size.
    pub fn rows_in_chunk(&self, index: usize) -> usize {
        if self.tiled {
            self.chunk_height
        } else {
            let start = (index / self.chunks_across) * self.chunk_height;
            self.chunk_height.min(self.image.height - start)
        }
    }

    /// Decoded size in bytes of a chunk
    pub fn chunk_len(&self, index: usize) -> usize {
        self.rows_in_chunk(index) * self.chunk_width * self.samples_per_pixel * self.data_type.size()
    }

    /// Decompresses one chunk and reverses its predictor. Empty chunks
    /// (byte count 0) decode to zeros.
    pub fn decode_chunk(&self, tags: &TagReader<'_>, byte_order: ByteOrder, index: usize) -> Result<Vec<u8>> {
        let expected = self.chunk_len(index);
        let byte_count = self.byte_counts[index];
        if byte_count == 0 {
            return Ok(vec![0u8; expected]);
        }

        let byte_count = usize::try_from(byte_count)
            .map_err(|_| Error::InvalidFormat(format!("Chunk {} byte count overflows", index)))?;
        let raw = tags.slice(self.offsets[index], byte_count)?;

        let mut decoded = self.compression.decompress(raw, expected)?;
        self.predictor.apply(
            &mut decoded,
            self.chunk_width,
            self.rows_in_chunk(index),
            self.samples_per_pixel,
            self.data_type,
            byte_order,
        )?;

        Ok(decoded)
    }

    /// Decodes every chunk of band 1 and assembles the row-major samples
    pub fn read_band(&self, tags: &TagReader<'_>, byte_order: ByteOrder) -> Result<Vec<f64>> {
        debug!(
            width = self.image.width,
            height = self.image.height,
            chunks = self.chunk_count(),
            tiled = self.tiled,
            compression = self.compression.name(),
            data_type = self.data_type.name(),
            "Decoding raster band"
        );

        let chunks = (0..self.chunk_count())
            .into_par_iter()
            .map(|index| self.decode_chunk(tags, byte_order, index))
            .collect::<Result<Vec<_>>>()?;

        let mut band = vec![0f64; self.image.pixel_count()];
        for (index, chunk) in chunks.iter().enumerate() {
            self.place_chunk(&mut band, index, chunk, byte_order);
        }

        Ok(band)
    }

    /// Copies the first sample of every in-bounds pixel of a chunk into the
    /// band, cropping overhanging tile edges.
    fn place_chunk(&self, band: &mut [f64], index: usize, chunk: &[u8], byte_order: ByteOrder) {
        let sample_size = self.data_type.size();
        let pixel_stride = self.samples_per_pixel * sample_size;
        let x0 = (index % self.chunks_across) * self.chunk_width;
        let y0 = (index / self.chunks_across) * self.chunk_height;
        let cols = self.chunk_width.min(self.image.width - x0);
        let rows = self.rows_in_chunk(index).min(self.image.height - y0);

        for row in 0..rows {
            let dest = (y0 + row) * self.image.width + x0;
            let src = row * self.chunk_width * pixel_stride;
            for (col, value) in band[dest..dest + cols].iter_mut().enumerate() {
                let at = src + col * pixel_stride;
                *value = read_sample(&chunk[at..at + sample_size], self.data_type, byte_order);
            }
        }
    }
}
