//! Image File Directory (IFD) structures

use std::collections::HashMap;

use super::tags;
use crate::compression::{Compression, Predictor};
use crate::error::{Error, Result};
use crate::types::{DataType, Dimensions};

/// Decoded payload of an IFD entry
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    /// BYTE, SHORT, LONG, LONG8 and IFD offsets
    Unsigned(Vec<u64>),
    /// SBYTE, SSHORT, SLONG, SLONG8
    Signed(Vec<i64>),
    /// FLOAT, DOUBLE and both rational types
    Float(Vec<f64>),
    /// ASCII with trailing NULs removed
    Ascii(String),
    /// UNDEFINED
    Undefined(Vec<u8>),
}

impl TagValue {
    pub fn len(&self) -> usize {
        match self {
            TagValue::Unsigned(v) => v.len(),
            TagValue::Signed(v) => v.len(),
            TagValue::Float(v) => v.len(),
            TagValue::Ascii(s) => s.len(),
            TagValue::Undefined(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Represents an Image File Directory entry
#[derive(Debug, Clone, PartialEq)]
pub struct IFDEntry {
    /// TIFF tag identifier
    pub tag: u16,
    /// Field type
    pub field_type: u16,
    /// Number of values declared in the directory
    pub count: u64,
    /// Values, already read from inline storage or their out-of-line offset
    pub value: TagValue,
}

impl IFDEntry {
    /// Creates a new IFD entry
    pub fn new(tag: u16, field_type: u16, count: u64, value: TagValue) -> Self {
        Self {
            tag,
            field_type,
            count,
            value,
        }
    }

    /// Creates an unsigned entry, sizing `count` from the values
    pub fn unsigned(tag: u16, field_type: u16, values: Vec<u64>) -> Self {
        Self::new(tag, field_type, values.len() as u64, TagValue::Unsigned(values))
    }

    /// Creates a DOUBLE entry
    pub fn doubles(tag: u16, values: Vec<f64>) -> Self {
        Self::new(tag, tags::field_types::DOUBLE, values.len() as u64, TagValue::Float(values))
    }

    /// Creates an ASCII entry
    pub fn ascii(tag: u16, text: &str) -> Self {
        Self::new(
            tag,
            tags::field_types::ASCII,
            text.len() as u64 + 1,
            TagValue::Ascii(text.to_string()),
        )
    }

    /// Returns the values as unsigned integers. Signed values are accepted
    /// when none is negative.
    pub fn u64_values(&self) -> Option<Vec<u64>> {
        match &self.value {
            TagValue::Unsigned(v) => Some(v.clone()),
            TagValue::Signed(v) => v.iter().map(|&x| u64::try_from(x).ok()).collect(),
            _ => None,
        }
    }

    /// Returns the values widened to f64
    pub fn f64_values(&self) -> Option<Vec<f64>> {
        match &self.value {
            TagValue::Float(v) => Some(v.clone()),
            TagValue::Unsigned(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TagValue::Signed(v) => Some(v.iter().map(|&x| x as f64).collect()),
            _ => None,
        }
    }

    pub fn as_ascii(&self) -> Option<&str> {
        match &self.value {
            TagValue::Ascii(s) => Some(s),
            _ => None,
        }
    }
}

/// Represents an Image File Directory
#[derive(Debug, Clone)]
pub struct IFD {
    /// IFD number (0-based)
    pub number: usize,
    /// Offset to this IFD in file
    pub offset: u64,
    /// Entries in this IFD
    pub entries: Vec<IFDEntry>,
    /// Tag map for quick lookup
    tag_map: HashMap<u16, usize>,
}

impl IFD {
    /// Creates a new IFD
    pub fn new(number: usize, offset: u64) -> Self {
        Self {
            number,
            offset,
            entries: Vec::new(),
            tag_map: HashMap::new(),
        }
    }

    /// Adds an entry to this IFD
    pub fn add_entry(&mut self, entry: IFDEntry) {
        let index = self.entries.len();
        self.tag_map.insert(entry.tag, index);
        self.entries.push(entry);
    }

    /// Gets an entry by tag
    pub fn get_entry(&self, tag: u16) -> Option<&IFDEntry> {
        self.tag_map.get(&tag).and_then(|&idx| self.entries.get(idx))
    }

    /// Gets the first value of an integer tag
    pub fn get_u64(&self, tag: u16) -> Option<u64> {
        self.get_u64s(tag)?.first().copied()
    }

    /// Gets all values of an integer tag
    pub fn get_u64s(&self, tag: u16) -> Option<Vec<u64>> {
        self.get_entry(tag)?.u64_values()
    }

    /// Gets all values of a numeric tag as f64
    pub fn get_f64s(&self, tag: u16) -> Option<Vec<f64>> {
        self.get_entry(tag)?.f64_values()
    }

    pub fn get_ascii(&self, tag: u16) -> Option<&str> {
        self.get_entry(tag)?.as_ascii()
    }

    /// Reads a required integer tag
    pub fn require_u64(&self, tag: u16) -> Result<u64> {
        self.get_u64(tag).ok_or(Error::MissingTag(tag))
    }

    /// Reads a required integer array tag
    pub fn require_u64s(&self, tag: u16) -> Result<Vec<u64>> {
        self.get_u64s(tag).ok_or(Error::MissingTag(tag))
    }

    /// Returns image dimensions if available
    pub fn dimensions(&self) -> Option<Dimensions> {
        let width = self.get_u64(tags::IMAGE_WIDTH)?;
        let height = self.get_u64(tags::IMAGE_LENGTH)?;
        Some(Dimensions::new(width as usize, height as usize))
    }

    /// Returns compression type, defaulting to none
    pub fn compression(&self) -> Result<Compression> {
        Compression::from_tag(self.get_u64(tags::COMPRESSION).unwrap_or(1))
    }

    /// Returns the predictor, defaulting to none
    pub fn predictor(&self) -> Result<Predictor> {
        Predictor::from_tag(self.get_u64(tags::PREDICTOR).unwrap_or(1))
    }

    /// Returns samples per pixel
    pub fn samples_per_pixel(&self) -> u64 {
        self.get_u64(tags::SAMPLES_PER_PIXEL).unwrap_or(1)
    }

    /// Returns bits per sample of the first channel
    pub fn bits_per_sample(&self) -> Option<u64> {
        self.get_u64(tags::BITS_PER_SAMPLE)
    }

    /// Returns sample format (1=unsigned, 2=signed, 3=float)
    pub fn sample_format(&self) -> u64 {
        self.get_u64(tags::SAMPLE_FORMAT).unwrap_or(1)
    }

    /// Returns planar configuration (1=chunky, 2=planar)
    pub fn planar_configuration(&self) -> u64 {
        self.get_u64(tags::PLANAR_CONFIGURATION).unwrap_or(1)
    }

    /// Determines the pixel data type based on TIFF tags
    pub fn data_type(&self) -> Result<DataType> {
        let bits = self.bits_per_sample().unwrap_or(1);
        let format = self.sample_format();

        DataType::from_format(format, bits).ok_or_else(|| {
            Error::Unsupported(format!("Sample format {} with {} bits per sample", format, bits))
        })
    }

    /// Returns whether this IFD represents a tiled image
    pub fn is_tiled(&self) -> bool {
        self.get_entry(tags::TILE_WIDTH).is_some()
    }

    /// Returns tile dimensions if tiled
    pub fn tile_dimensions(&self) -> Option<Dimensions> {
        let width = self.get_u64(tags::TILE_WIDTH)?;
        let height = self.get_u64(tags::TILE_LENGTH)?;
        Some(Dimensions::new(width as usize, height as usize))
    }

    /// Returns rows per strip, defaulting to the whole image in one strip
    pub fn rows_per_strip(&self) -> Option<u64> {
        self.get_u64(tags::ROWS_PER_STRIP)
            .or_else(|| self.get_u64(tags::IMAGE_LENGTH))
    }

    /// Returns number of entries
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns all GeoTIFF related tags
    pub fn geotiff_tags(&self) -> Vec<&IFDEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.tag,
                    tags::MODEL_PIXEL_SCALE
                        | tags::MODEL_TIEPOINT
                        | tags::MODEL_TRANSFORMATION
                        | tags::GEO_KEY_DIRECTORY
                        | tags::GEO_DOUBLE_PARAMS
                        | tags::GEO_ASCII_PARAMS
                )
            })
            .collect()
    }

    /// Checks if this IFD has GeoTIFF tags
    pub fn is_geotiff(&self) -> bool {
        !self.geotiff_tags().is_empty()
    }
}
