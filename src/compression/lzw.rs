//! LZW decompression
//!
//! TIFF LZW packs codes most-significant-bit first and switches to the next
//! code width one code early (at 511, 1023 and 2047 rather than 512, 1024
//! and 2048).

use super::capacity_hint;
use crate::error::{Error, Result};

const CLEAR_CODE: u16 = 256;
const EOI_CODE: u16 = 257;
const FIRST_FREE: usize = 258;
const MAX_CODES: usize = 4096;
const MIN_WIDTH: u8 = 9;
const MAX_WIDTH: u8 = 12;

/// Decompresses LZW compressed data
pub fn decompress(data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
    LzwDecoder::new().decode(data, expected_len)
}

/// Prefix-chained string table: each entry is its prefix code plus one byte.
struct LzwDecoder {
    prefix: Vec<u16>,
    suffix: Vec<u8>,
    first: Vec<u8>,
    length: Vec<usize>,
}

impl LzwDecoder {
    fn new() -> Self {
        let mut decoder = Self {
            prefix: Vec::with_capacity(MAX_CODES),
            suffix: Vec::with_capacity(MAX_CODES),
            first: Vec::with_capacity(MAX_CODES),
            length: Vec::with_capacity(MAX_CODES),
        };

        for byte in 0..=255u8 {
            decoder.prefix.push(0);
            decoder.suffix.push(byte);
            decoder.first.push(byte);
            decoder.length.push(1);
        }

        // Clear and end-of-information occupy codes 256 and 257
        for _ in 0..2 {
            decoder.prefix.push(0);
            decoder.suffix.push(0);
            decoder.first.push(0);
            decoder.length.push(0);
        }

        decoder
    }

    fn reset(&mut self) {
        self.prefix.truncate(FIRST_FREE);
        self.suffix.truncate(FIRST_FREE);
        self.first.truncate(FIRST_FREE);
        self.length.truncate(FIRST_FREE);
    }

    fn decode(&mut self, data: &[u8], expected_len: usize) -> Result<Vec<u8>> {
        let mut output = Vec::with_capacity(capacity_hint(data.len(), expected_len));
        let mut reader = BitReader::new(data);
        let mut width = MIN_WIDTH;
        let mut previous: Option<u16> = None;

        while let Some(code) = reader.read_bits(width) {
            if code == EOI_CODE {
                break;
            }

            if code == CLEAR_CODE {
                self.reset();
                width = MIN_WIDTH;
                previous = None;
                continue;
            }

            let index = code as usize;
            let next = self.length.len();

            match previous {
                None => {
                    if index > 255 {
                        return Err(Error::InvalidFormat(format!(
                            "LZW code {} follows a clear code",
                            code
                        )));
                    }
                    output.push(code as u8);
                }
                Some(prev) => {
                    let prev = prev as usize;
                    let first_byte = if index < next {
                        self.emit(index, &mut output);
                        self.first[index]
                    } else if index == next {
                        let byte = self.first[prev];
                        self.emit(prev, &mut output);
                        output.push(byte);
                        byte
                    } else {
                        return Err(Error::InvalidFormat(format!("Invalid LZW code: {}", code)));
                    };

                    if next < MAX_CODES {
                        self.add_entry(prev, first_byte);
                    }
                }
            }

            previous = Some(code);

            if self.length.len() + 1 >= (1usize << width) && width < MAX_WIDTH {
                width += 1;
            }

            if output.len() >= expected_len {
                break;
            }
        }

        Ok(output)
    }

    fn add_entry(&mut self, prefix: usize, byte: u8) {
        self.prefix.push(prefix as u16);
        self.suffix.push(byte);
        self.first.push(self.first[prefix]);
        self.length.push(self.length[prefix] + 1);
    }

    /// Appends the string for `code` by walking its prefix chain backwards
    fn emit(&self, code: usize, output: &mut Vec<u8>) {
        let len = self.length[code];
        let start = output.len();
        output.resize(start + len, 0);

        let mut current = code;
        for slot in output[start..].iter_mut().rev() {
            *slot = self.suffix[current];
            current = self.prefix[current] as usize;
        }
    }
}

/// Reads MSB-first variable-width codes from a byte stream
struct BitReader<'a> {
    data: &'a [u8],
    position: usize,
    buffer: u32,
    bits: u8,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            position: 0,
            buffer: 0,
            bits: 0,
        }
    }

    fn read_bits(&mut self, count: u8) -> Option<u16> {
        while self.bits < count {
            let byte = *self.data.get(self.position)?;
            self.position += 1;
            self.buffer = (self.buffer << 8) | byte as u32;
            self.bits += 8;
        }

        self.bits -= count;
        let code = (self.buffer >> self.bits) & ((1u32 << count) - 1);
        self.buffer &= (1u32 << self.bits) - 1;
        Some(code as u16)
    }
}
