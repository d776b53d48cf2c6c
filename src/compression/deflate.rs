//! Deflate/ZIP decompression

use super::capacity_hint;
use crate::error::{Error, Result};
use flate2::read::ZlibDecoder;
use std::io::Read;

/// Decompresses a zlib-wrapped Deflate chunk, stopping after `expected_len`
/// bytes
pub fn decompress(data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    let mut decompressed = Vec::with_capacity(capacity_hint(data.len(), expected_len));
    ZlibDecoder::new(data)
        .take(expected_len as u64)
        .read_to_end(&mut decompressed)
        .map_err(|e| Error::InvalidFormat(format!("Deflate error: {}", e)))?;
    Ok(decompressed)
}
