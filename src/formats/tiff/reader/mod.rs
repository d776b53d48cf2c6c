//! TIFF reader modules
//!
//! The reader works over an in-memory (or memory-mapped) byte slice: the
//! header is validated once, the IFD chain is walked eagerly, and band
//! samples are assembled from strips or tiles on request.

pub mod chunks;
pub mod samples;
pub mod tags;

#[cfg(test)]
pub(crate) mod fixtures;

use std::collections::HashSet;

use tracing::debug;

use crate::error::{Error, Result};
use crate::formats::tiff::{Tiff, BIGTIFF_MAGIC, IFD, TIFF_MAGIC};
use crate::io::ByteOrder;

use self::chunks::ChunkLayout;
use self::tags::TagReader;

/// Upper bound on directories walked before the chain is declared corrupt
const MAX_IFDS: usize = 1000;

/// TIFF reader over a byte slice
pub struct TiffReader<'a> {
    data: &'a [u8],
    byte_order: ByteOrder,
    is_big_tiff: bool,
    first_ifd_offset: u64,
}

impl<'a> TiffReader<'a> {
    /// Parses the TIFF or BigTIFF header
    pub fn new(data: &'a [u8]) -> Result<Self> {
        if data.len() < 8 {
            return Err(Error::InvalidFormat(format!(
                "File too short for a TIFF header: {} bytes",
                data.len()
            )));
        }

        let byte_order = ByteOrder::from_tiff_magic([data[0], data[1]])
            .ok_or_else(|| Error::InvalidByteOrder(u16::from_be_bytes([data[0], data[1]])))?;

        let magic = byte_order.u16_at(&data[2..]);
        let is_big_tiff = match magic {
            TIFF_MAGIC => false,
            BIGTIFF_MAGIC => true,
            _ => return Err(Error::InvalidMagic(magic)),
        };

        let first_ifd_offset = if is_big_tiff {
            if data.len() < 16 {
                return Err(Error::InvalidFormat("Truncated BigTIFF header".to_string()));
            }
            let offset_size = byte_order.u16_at(&data[4..]);
            if offset_size != 8 {
                return Err(Error::InvalidFormat(format!(
                    "Invalid BigTIFF offset size: {}",
                    offset_size
                )));
            }
            byte_order.u64_at(&data[8..])
        } else {
            byte_order.u32_at(&data[4..]) as u64
        };

        Ok(Self {
            data,
            byte_order,
            is_big_tiff,
            first_ifd_offset,
        })
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn is_big_tiff(&self) -> bool {
        self.is_big_tiff
    }

    fn tag_reader(&self) -> TagReader<'a> {
        TagReader::new(self.data, self.byte_order, self.is_big_tiff)
    }

    /// Walks the IFD chain and returns the file structure
    pub fn read(&self) -> Result<Tiff> {
        let mut tiff = Tiff::new(self.byte_order, self.is_big_tiff);
        let mut visited = HashSet::new();
        let mut next_ifd_offset = self.first_ifd_offset;

        while next_ifd_offset != 0 {
            if tiff.ifd_count() >= MAX_IFDS {
                return Err(Error::InvalidFormat("Too many IFDs".to_string()));
            }
            if !visited.insert(next_ifd_offset) {
                return Err(Error::InvalidFormat(format!(
                    "IFD chain loops back to offset {}",
                    next_ifd_offset
                )));
            }

            let (ifd, next) = self.read_ifd(tiff.ifd_count(), next_ifd_offset)?;
            tiff.add_ifd(ifd);
            next_ifd_offset = next;
        }

        if tiff.ifd_count() == 0 {
            return Err(Error::InvalidFormat("File contains no IFD".to_string()));
        }

        debug!(
            ifds = tiff.ifd_count(),
            big_tiff = self.is_big_tiff,
            byte_order = ?self.byte_order,
            "Read TIFF structure"
        );

        Ok(tiff)
    }

    /// Reads a single IFD and the offset of the next one
    fn read_ifd(&self, number: usize, offset: u64) -> Result<(IFD, u64)> {
        let tags = self.tag_reader();
        let entry_count = tags.read_entry_count(offset)?;
        let header_size: u64 = if self.is_big_tiff { 8 } else { 2 };
        let entry_size = tags.entry_size() as u64;

        let entries_len = entry_count
            .checked_mul(entry_size)
            .filter(|len| *len <= self.data.len() as u64)
            .ok_or_else(|| {
                Error::InvalidFormat(format!("IFD {} declares {} entries", number, entry_count))
            })?;

        let mut ifd = IFD::new(number, offset);
        let first_entry = offset + header_size;
        for i in 0..entry_count {
            if let Some(entry) = tags.read_entry(first_entry + i * entry_size)? {
                ifd.add_entry(entry);
            }
        }

        let next = tags.read_offset(first_entry + entries_len)?;
        Ok((ifd, next))
    }

    /// Reads band 1 of the given directory as row-major f64 samples
    pub fn read_band(&self, ifd: &IFD) -> Result<Vec<f64>> {
        let layout = ChunkLayout::from_ifd(ifd)?;
        layout.read_band(&self.tag_reader(), self.byte_order)
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::TiffBuilder;
    use super::*;
    use crate::compression::{Compression, Predictor};
    use crate::formats::tiff::tags as tag_ids;
    use crate::types::DataType;

    fn ramp(width: usize, height: usize) -> Vec<f64> {
        (0..width * height).map(|i| (i % 251) as f64 + 1.0).collect()
    }

    #[test]
    fn test_minimal_header() {
        let mut data = Vec::new();
        data.extend_from_slice(b"II");
        data.extend_from_slice(&42u16.to_le_bytes());
        data.extend_from_slice(&8u32.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend_from_slice(&256u16.to_le_bytes());
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&1024u32.to_le_bytes());
        data.extend_from_slice(&0u32.to_le_bytes());

        let reader = TiffReader::new(&data).unwrap();
        assert!(!reader.is_big_tiff());
        let tiff = reader.read().unwrap();
        assert_eq!(tiff.ifd_count(), 1);
        assert_eq!(tiff.main_ifd().unwrap().get_u64(tag_ids::IMAGE_WIDTH), Some(1024));
    }

    #[test]
    fn test_invalid_byte_order() {
        let data = b"XX\x2a\x00\x08\x00\x00\x00";
        assert!(matches!(TiffReader::new(data), Err(Error::InvalidByteOrder(0x5858))));
    }

    #[test]
    fn test_invalid_magic() {
        let data = b"II\x2b\x01\x08\x00\x00\x00";
        assert!(matches!(TiffReader::new(data), Err(Error::InvalidMagic(299))));
    }

    #[test]
    fn test_truncated_file() {
        assert!(matches!(TiffReader::new(b"II*"), Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_ifd_cycle_is_detected() {
        let mut data = TiffBuilder::new(2, 2).samples(vec![1.0; 4]).build();
        let ifd_offset = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let len = data.len();
        data[len - 4..].copy_from_slice(&ifd_offset.to_le_bytes());

        let reader = TiffReader::new(&data).unwrap();
        let err = reader.read().unwrap_err();
        assert!(err.to_string().contains("loops"));
    }

    #[test]
    fn test_big_endian_strips() {
        let samples = ramp(7, 5);
        let data = TiffBuilder::new(7, 5)
            .big_endian()
            .data_type(DataType::U16)
            .rows_per_strip(2)
            .samples(samples.clone())
            .build();

        let reader = TiffReader::new(&data).unwrap();
        assert_eq!(reader.byte_order(), ByteOrder::BigEndian);
        let tiff = reader.read().unwrap();
        let band = reader.read_band(tiff.main_ifd().unwrap()).unwrap();
        assert_eq!(band, samples);
    }

    #[test]
    fn test_bigtiff_f64() {
        let samples: Vec<f64> = ramp(4, 3).iter().map(|v| v * 0.5 - 10.0).collect();
        let data = TiffBuilder::new(4, 3)
            .big_tiff()
            .data_type(DataType::F64)
            .samples(samples.clone())
            .build();

        let reader = TiffReader::new(&data).unwrap();
        assert!(reader.is_big_tiff());
        let tiff = reader.read().unwrap();
        assert_eq!(reader.read_band(tiff.main_ifd().unwrap()).unwrap(), samples);
    }

    #[test]
    fn test_tiles_with_partial_edges() {
        let samples = ramp(10, 7);
        let data = TiffBuilder::new(10, 7)
            .tiles(4, 4)
            .data_type(DataType::F32)
            .samples(samples.clone())
            .build();

        let reader = TiffReader::new(&data).unwrap();
        let tiff = reader.read().unwrap();
        let ifd = tiff.main_ifd().unwrap();
        assert!(ifd.is_tiled());
        assert_eq!(reader.read_band(ifd).unwrap(), samples);
    }

    #[test]
    fn test_compressed_layouts() {
        let samples = ramp(9, 6);
        for compression in [Compression::Lzw, Compression::Deflate, Compression::PackBits] {
            for tiled in [false, true] {
                let mut builder = TiffBuilder::new(9, 6)
                    .data_type(DataType::I16)
                    .compression(compression)
                    .samples(samples.clone());
                builder = if tiled { builder.tiles(4, 4) } else { builder.rows_per_strip(4) };
                let data = builder.build();

                let reader = TiffReader::new(&data).unwrap();
                let tiff = reader.read().unwrap();
                let band = reader.read_band(tiff.main_ifd().unwrap()).unwrap();
                assert_eq!(band, samples, "{:?} tiled={}", compression, tiled);
            }
        }
    }

    #[test]
    fn test_horizontal_predictor_u16() {
        let samples = ramp(12, 4);
        let data = TiffBuilder::new(12, 4)
            .data_type(DataType::U16)
            .compression(Compression::Lzw)
            .predictor(Predictor::Horizontal)
            .samples(samples.clone())
            .build();

        let reader = TiffReader::new(&data).unwrap();
        let tiff = reader.read().unwrap();
        assert_eq!(reader.read_band(tiff.main_ifd().unwrap()).unwrap(), samples);
    }

    #[test]
    fn test_floating_point_predictor_both_byte_orders() {
        let samples: Vec<f64> = ramp(8, 5).iter().map(|v| v / 3.0).collect();
        let expected: Vec<f64> = samples.iter().map(|&v| v as f32 as f64).collect();

        for big_endian in [false, true] {
            let mut builder = TiffBuilder::new(8, 5)
                .data_type(DataType::F32)
                .compression(Compression::Deflate)
                .predictor(Predictor::FloatingPoint)
                .tiles(4, 4)
                .samples(samples.clone());
            if big_endian {
                builder = builder.big_endian();
            }
            let data = builder.build();

            let reader = TiffReader::new(&data).unwrap();
            let tiff = reader.read().unwrap();
            assert_eq!(reader.read_band(tiff.main_ifd().unwrap()).unwrap(), expected);
        }
    }

    #[test]
    fn test_first_channel_of_chunky_pixels() {
        // Three interleaved channels; band 1 holds the pixel index
        let samples: Vec<f64> = (0..6 * 4)
            .flat_map(|i| [i as f64 + 1.0, 500.0, 900.0])
            .collect();
        let data = TiffBuilder::new(6, 4)
            .data_type(DataType::U16)
            .samples_per_pixel(3)
            .predictor(Predictor::Horizontal)
            .samples(samples)
            .build();

        let reader = TiffReader::new(&data).unwrap();
        let tiff = reader.read().unwrap();
        let band = reader.read_band(tiff.main_ifd().unwrap()).unwrap();
        assert_eq!(band, (1..=24).map(|v| v as f64).collect::<Vec<_>>());
    }

    #[test]
    fn test_first_plane_of_planar_image() {
        let samples: Vec<f64> = (0..5 * 3)
            .flat_map(|i| [i as f64 * 2.0, -1.0])
            .collect();
        let data = TiffBuilder::new(5, 3)
            .data_type(DataType::I32)
            .samples_per_pixel(2)
            .planar()
            .rows_per_strip(2)
            .samples(samples)
            .build();

        let reader = TiffReader::new(&data).unwrap();
        let tiff = reader.read().unwrap();
        let band = reader.read_band(tiff.main_ifd().unwrap()).unwrap();
        assert_eq!(band, (0..15).map(|v| v as f64 * 2.0).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_chunk_is_zero_filled() {
        let data = TiffBuilder::new(4, 4)
            .rows_per_strip(2)
            .samples(vec![5.0; 16])
            .empty_chunk(1)
            .build();

        let reader = TiffReader::new(&data).unwrap();
        let tiff = reader.read().unwrap();
        let band = reader.read_band(tiff.main_ifd().unwrap()).unwrap();
        assert_eq!(&band[..8], &[5.0; 8]);
        assert_eq!(&band[8..], &[0.0; 8]);
    }

    #[test]
    fn test_unsupported_compression() {
        let data = TiffBuilder::new(2, 2)
            .samples(vec![1.0; 4])
            .raw_compression_tag(7)
            .build();

        let reader = TiffReader::new(&data).unwrap();
        let tiff = reader.read().unwrap();
        let err = reader.read_band(tiff.main_ifd().unwrap()).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)));
    }

    #[test]
    fn test_zero_dimensions() {
        let data = TiffBuilder::new(0, 3).samples(vec![]).build();
        let reader = TiffReader::new(&data).unwrap();
        let tiff = reader.read().unwrap();
        assert!(matches!(
            reader.read_band(tiff.main_ifd().unwrap()),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_chunk_past_end_of_file() {
        let mut data = TiffBuilder::new(4, 4).samples(vec![3.0; 16]).build();
        data.truncate(20);
        let reader = TiffReader::new(&data).unwrap();
        assert!(reader.read().is_err());
    }

    /// Little-endian TIFF with one IFD of single-valued inline entries
    /// `(tag, field type, value)`; chunk payload starts at offset 8.
    fn declared_tiff(entries: &[(u16, u16, u32)], payload: &[u8]) -> Vec<u8> {
        let mut data = b"II\x2a\x00".to_vec();
        let ifd_offset = 8 + payload.len() + payload.len() % 2;
        data.extend_from_slice(&(ifd_offset as u32).to_le_bytes());
        data.extend_from_slice(payload);
        data.resize(ifd_offset, 0);

        let mut entries = entries.to_vec();
        entries.sort_by_key(|e| e.0);
        data.extend_from_slice(&(entries.len() as u16).to_le_bytes());
        for (tag, field_type, value) in entries {
            data.extend_from_slice(&tag.to_le_bytes());
            data.extend_from_slice(&field_type.to_le_bytes());
            data.extend_from_slice(&1u32.to_le_bytes());
            if field_type == 3 {
                data.extend_from_slice(&(value as u16).to_le_bytes());
                data.extend_from_slice(&[0, 0]);
            } else {
                data.extend_from_slice(&value.to_le_bytes());
            }
        }
        data.extend_from_slice(&0u32.to_le_bytes());
        data
    }

    fn read_declared(data: &[u8]) -> Result<Vec<f64>> {
        let reader = TiffReader::new(data)?;
        let tiff = reader.read()?;
        let ifd = tiff.main_ifd().ok_or_else(|| Error::InvalidFormat("no IFD".into()))?;
        reader.read_band(ifd)
    }

    #[test]
    fn test_oversized_tiles_are_rejected() {
        let data = declared_tiff(
            &[
                (tag_ids::IMAGE_WIDTH, 4, 1),
                (tag_ids::IMAGE_LENGTH, 4, 1),
                (tag_ids::BITS_PER_SAMPLE, 3, 64),
                (tag_ids::SAMPLE_FORMAT, 3, 3),
                (tag_ids::TILE_WIDTH, 4, u32::MAX),
                (tag_ids::TILE_LENGTH, 4, u32::MAX),
                (tag_ids::TILE_OFFSETS, 4, 8),
                (tag_ids::TILE_BYTE_COUNTS, 4, 8),
            ],
            &1.5f64.to_le_bytes(),
        );

        let err = read_declared(&data).unwrap_err();
        assert!(matches!(err, Error::InvalidFormat(_)), "{:?}", err);
    }

    #[test]
    fn test_huge_deflate_tiles_fail_without_allocating() {
        let data = declared_tiff(
            &[
                (tag_ids::IMAGE_WIDTH, 4, 1),
                (tag_ids::IMAGE_LENGTH, 4, 1),
                (tag_ids::BITS_PER_SAMPLE, 3, 8),
                (tag_ids::COMPRESSION, 3, 8),
                (tag_ids::TILE_WIDTH, 4, 1 << 20),
                (tag_ids::TILE_LENGTH, 4, 1 << 20),
                (tag_ids::TILE_OFFSETS, 4, 8),
                (tag_ids::TILE_BYTE_COUNTS, 4, 8),
            ],
            &[0x78, 0x9C, 0x63, 0x04, 0x00, 0x00, 0x02, 0x00],
        );

        let err = read_declared(&data).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn test_huge_sample_count_is_rejected() {
        let data = declared_tiff(
            &[
                (tag_ids::IMAGE_WIDTH, 4, 1),
                (tag_ids::IMAGE_LENGTH, 4, 1),
                (tag_ids::BITS_PER_SAMPLE, 3, 8),
                (tag_ids::SAMPLES_PER_PIXEL, 4, u32::MAX),
                (tag_ids::STRIP_OFFSETS, 4, 8),
                (tag_ids::STRIP_BYTE_COUNTS, 4, 1),
            ],
            &[7],
        );

        let err = read_declared(&data).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)), "{:?}", err);
    }

    #[test]
    fn test_huge_image_is_rejected_before_decoding() {
        let data = declared_tiff(
            &[
                (tag_ids::IMAGE_WIDTH, 4, 1 << 20),
                (tag_ids::IMAGE_LENGTH, 4, 1 << 20),
                (tag_ids::BITS_PER_SAMPLE, 3, 8),
                (tag_ids::COMPRESSION, 3, 8),
                (tag_ids::ROWS_PER_STRIP, 4, 1),
                (tag_ids::STRIP_OFFSETS, 4, 8),
                (tag_ids::STRIP_BYTE_COUNTS, 4, 1),
            ],
            &[0],
        );

        let err = read_declared(&data).unwrap_err();
        assert!(matches!(err, Error::Unsupported(_)), "{:?}", err);
    }

    #[test]
    fn test_tiles_larger_than_small_image_are_accepted() {
        let data = TiffBuilder::new(3, 2)
            .tiles(16, 16)
            .samples(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0])
            .build();
        assert_eq!(read_declared(&data).unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }
}
