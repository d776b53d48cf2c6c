//! Error types for firemap-rasterizer

use std::io;
use thiserror::Error;

use crate::formats::tiff::tags;

/// Result type for firemap-rasterizer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a raster-to-overlay conversion
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error while reading the raster resource
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed TIFF structure
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// First two bytes are neither `II` nor `MM`
    #[error("Invalid byte order: 0x{0:04X}")]
    InvalidByteOrder(u16),

    /// Header magic is neither 42 (TIFF) nor 43 (BigTIFF)
    #[error("Invalid TIFF magic number: {0}")]
    InvalidMagic(u16),

    /// Missing required tag
    #[error("Missing required tag: {0} ({})", tag_label(.0))]
    MissingTag(u16),

    /// Valid TIFF using a feature this decoder does not handle
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Neither ModelPixelScale nor ModelTransformation is present
    #[error("Raster has no pixel resolution metadata")]
    MissingResolution,

    /// Raster URL could not be fetched
    #[error("Failed to fetch raster: {0}")]
    Fetch(String),

    /// Center coordinate outside the supported range
    #[error("Input out of range: {0}")]
    InputRange(String),

    /// Every sample is 0 or NaN, so the value range is undefined
    #[error("Raster contains no data: all {width}x{height} pixels are 0 or NaN")]
    NoData { width: usize, height: usize },

    /// PNG serialization failed
    #[error("Encode error: {0}")]
    Encode(String),
}

impl Error {
    /// Returns true for errors caused by an unreachable, malformed or
    /// unsupported raster resource.
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            Error::Io(_)
                | Error::InvalidFormat(_)
                | Error::InvalidByteOrder(_)
                | Error::InvalidMagic(_)
                | Error::MissingTag(_)
                | Error::Unsupported(_)
                | Error::MissingResolution
                | Error::Fetch(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::Fetch(error.to_string())
    }
}

fn tag_label(tag: &u16) -> &'static str {
    tags::tag_name(*tag)
}
