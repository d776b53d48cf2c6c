//! PackBits decompression
//!
//! PackBits is a simple run-length encoding scheme used in TIFF files.

use super::capacity_hint;
use crate::error::{Error, Result};

/// Decompresses PackBits compressed data
///
/// PackBits encoding:
/// - If header >= 0: copy next (header + 1) literal bytes
/// - If header < 0 and != -128: repeat next byte (1 - header) times
/// - If header == -128: no operation (skip)
///
/// Decoding stops once `expected_len` bytes have been produced.
pub fn decompress(data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(capacity_hint(data.len(), expected_len));
    let mut pos = 0;

    while pos < data.len() && output.len() < expected_len {
        let header = data[pos] as i8;
        pos += 1;

        match header {
            -128 => continue,

            0..=127 => {
                let count = header as usize + 1;
                let literal = data.get(pos..pos + count).ok_or_else(|| {
                    Error::InvalidFormat("PackBits: Insufficient literal bytes".to_string())
                })?;

                output.extend_from_slice(literal);
                pos += count;
            }

            -127..=-1 => {
                let byte = *data.get(pos).ok_or_else(|| {
                    Error::InvalidFormat("PackBits: Missing run byte".to_string())
                })?;
                pos += 1;

                let count = (1 - header as isize) as usize;
                output.resize(output.len() + count, byte);
            }
        }
    }

    Ok(output)
}
