//! Tag value reading operations

use crate::error::{Error, Result};
use crate::formats::tiff::ifd::{IFDEntry, TagValue};
use crate::formats::tiff::tags::{self, field_types};
use crate::io::ByteOrder;
use tracing::debug;

/// Decodes IFD entries and their payloads from the raw file bytes
pub struct TagReader<'a> {
    data: &'a [u8],
    byte_order: ByteOrder,
    is_big_tiff: bool,
}

impl<'a> TagReader<'a> {
    pub fn new(data: &'a [u8], byte_order: ByteOrder, is_big_tiff: bool) -> Self {
        Self {
            data,
            byte_order,
            is_big_tiff,
        }
    }

    /// Size of one directory entry (12 bytes, or 20 for BigTIFF)
    pub fn entry_size(&self) -> usize {
        if self.is_big_tiff {
            20
        } else {
            12
        }
    }

    /// Size of the value/offset field inside an entry
    fn inline_size(&self) -> usize {
        if self.is_big_tiff {
            8
        } else {
            4
        }
    }

    /// Returns `len` bytes starting at `offset`, or an error if the range
    /// leaves the file.
    pub fn slice(&self, offset: u64, len: usize) -> Result<&'a [u8]> {
        let start = usize::try_from(offset)
            .map_err(|_| Error::InvalidFormat(format!("Offset {} out of range", offset)))?;
        start
            .checked_add(len)
            .and_then(|end| self.data.get(start..end))
            .ok_or_else(|| {
                Error::InvalidFormat(format!(
                    "Range {}+{} exceeds file size {}",
                    start,
                    len,
                    self.data.len()
                ))
            })
    }

    /// Reads a file offset (4 bytes, or 8 for BigTIFF) at `position`
    pub fn read_offset(&self, position: u64) -> Result<u64> {
        let raw = self.slice(position, self.inline_size())?;
        Ok(if self.is_big_tiff {
            self.byte_order.u64_at(raw)
        } else {
            self.byte_order.u32_at(raw) as u64
        })
    }

    /// Reads the entry count that starts a directory
    pub fn read_entry_count(&self, ifd_offset: u64) -> Result<u64> {
        if self.is_big_tiff {
            Ok(self.byte_order.u64_at(self.slice(ifd_offset, 8)?))
        } else {
            Ok(self.byte_order.u16_at(self.slice(ifd_offset, 2)?) as u64)
        }
    }

    /// Reads one directory entry at `position`.
    ///
    /// Entries with a field type this reader does not know are skipped and
    /// yield `None`.
    pub fn read_entry(&self, position: u64) -> Result<Option<IFDEntry>> {
        let raw = self.slice(position, self.entry_size())?;
        let tag = self.byte_order.u16_at(&raw[0..]);
        let field_type = self.byte_order.u16_at(&raw[2..]);
        let (count, value_field) = if self.is_big_tiff {
            (self.byte_order.u64_at(&raw[4..]), &raw[12..20])
        } else {
            (self.byte_order.u32_at(&raw[4..]) as u64, &raw[8..12])
        };

        let Some(value_size) = field_types::size(field_type) else {
            debug!(tag, field_type, "Skipping entry with unknown field type");
            return Ok(None);
        };

        let total = usize::try_from(count)
            .ok()
            .and_then(|count| count.checked_mul(value_size))
            .ok_or_else(|| {
                Error::InvalidFormat(format!(
                    "Tag {} ({}) has an impossible count {}",
                    tag,
                    tags::tag_name(tag),
                    count
                ))
            })?;

        let payload = if total <= self.inline_size() {
            &value_field[..total]
        } else {
            let offset = if self.is_big_tiff {
                self.byte_order.u64_at(value_field)
            } else {
                self.byte_order.u32_at(value_field) as u64
            };
            self.slice(offset, total)?
        };

        let value = self.decode_values(field_type, payload);
        Ok(Some(IFDEntry::new(tag, field_type, count, value)))
    }

    /// Decodes a payload of the given field type
    pub fn decode_values(&self, field_type: u16, payload: &[u8]) -> TagValue {
        let bo = self.byte_order;

        match field_type {
            field_types::BYTE => TagValue::Unsigned(payload.iter().map(|&b| b as u64).collect()),
            field_types::SHORT => TagValue::Unsigned(
                payload.chunks_exact(2).map(|c| bo.u16_at(c) as u64).collect(),
            ),
            field_types::LONG | field_types::IFD => TagValue::Unsigned(
                payload.chunks_exact(4).map(|c| bo.u32_at(c) as u64).collect(),
            ),
            field_types::LONG8 | field_types::IFD8 => {
                TagValue::Unsigned(payload.chunks_exact(8).map(|c| bo.u64_at(c)).collect())
            }
            field_types::SBYTE => {
                TagValue::Signed(payload.iter().map(|&b| b as i8 as i64).collect())
            }
            field_types::SSHORT => TagValue::Signed(
                payload.chunks_exact(2).map(|c| bo.i16_at(c) as i64).collect(),
            ),
            field_types::SLONG => TagValue::Signed(
                payload.chunks_exact(4).map(|c| bo.i32_at(c) as i64).collect(),
            ),
            field_types::SLONG8 => {
                TagValue::Signed(payload.chunks_exact(8).map(|c| bo.i64_at(c)).collect())
            }
            field_types::FLOAT => TagValue::Float(
                payload.chunks_exact(4).map(|c| bo.f32_at(c) as f64).collect(),
            ),
            field_types::DOUBLE => {
                TagValue::Float(payload.chunks_exact(8).map(|c| bo.f64_at(c)).collect())
            }
            field_types::RATIONAL => TagValue::Float(
                payload
                    .chunks_exact(8)
                    .map(|c| ratio(bo.u32_at(c) as f64, bo.u32_at(&c[4..]) as f64))
                    .collect(),
            ),
            field_types::SRATIONAL => TagValue::Float(
                payload
                    .chunks_exact(8)
                    .map(|c| ratio(bo.i32_at(c) as f64, bo.i32_at(&c[4..]) as f64))
                    .collect(),
            ),
            field_types::ASCII => TagValue::Ascii(
                String::from_utf8_lossy(payload)
                    .trim_end_matches('\0')
                    .to_string(),
            ),
            _ => TagValue::Undefined(payload.to_vec()),
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}
