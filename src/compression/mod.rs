//! Decompression of TIFF strip and tile payloads

pub mod deflate;
pub mod lzw;
pub mod packbits;
pub mod predictor;

use crate::error::{Error, Result};

pub use predictor::Predictor;

/// Expansion ratio assumed when pre-allocating codec output
const EXPANSION_HINT: usize = 16;

/// Initial output capacity of a codec: the declared size, bounded by what
/// the compressed input is likely to expand to. Output still grows past it
/// on demand.
pub(crate) fn capacity_hint(compressed_len: usize, expected_len: usize) -> usize {
    expected_len.min(compressed_len.saturating_mul(EXPANSION_HINT))
}

/// Compression types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// No compression
    None,
    /// Deflate/ZIP compression (tag 8 and the legacy 32946)
    Deflate,
    /// LZW compression
    Lzw,
    /// PackBits compression
    PackBits,
}

impl Compression {
    /// Creates compression from TIFF compression tag value
    pub fn from_tag(value: u64) -> Result<Self> {
        match value {
            1 => Ok(Compression::None),
            5 => Ok(Compression::Lzw),
            8 | 32946 => Ok(Compression::Deflate),
            32773 => Ok(Compression::PackBits),
            _ => Err(Error::Unsupported(format!("Compression type {}", value))),
        }
    }

    /// Returns the name of this compression type
    pub fn name(&self) -> &'static str {
        match self {
            Compression::None => "None",
            Compression::Deflate => "Deflate/ZIP",
            Compression::Lzw => "LZW",
            Compression::PackBits => "PackBits",
        }
    }

    /// Decompresses one chunk.
    ///
    /// `expected_len` is the decoded size the chunk must have. Longer output
    /// is truncated (some encoders pad the last row); shorter output is an
    /// error.
    pub fn decompress(&self, data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let mut decoded = match self {
            Compression::None => data.to_vec(),
            Compression::Deflate => deflate::decompress(data, expected_len)?,
            Compression::Lzw => lzw::decompress(data, expected_len)?,
            Compression::PackBits => packbits::decompress(data, expected_len)?,
        };

        if decoded.len() < expected_len {
            return Err(Error::InvalidFormat(format!(
                "{} chunk decoded to {} bytes, expected {}",
                self.name(),
                decoded.len(),
                expected_len
            )));
        }

        decoded.truncate(expected_len);
        Ok(decoded)
    }
}
