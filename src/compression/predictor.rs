//! TIFF predictors
//!
//! Predictors are applied after decompression, row by row within a strip or
//! tile. Sample values are left in the file's byte order so the sample
//! decoder can treat predicted and unpredicted chunks alike.

use crate::error::{Error, Result};
use crate::io::ByteOrder;
use crate::types::DataType;

/// Predictor scheme declared by the Predictor tag (317)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predictor {
    /// No prediction (1)
    None,
    /// Horizontal differencing of integer samples (2)
    Horizontal,
    /// Byte-plane differencing of floating point samples (3)
    FloatingPoint,
}

impl Predictor {
    pub fn from_tag(value: u64) -> Result<Self> {
        match value {
            1 => Ok(Predictor::None),
            2 => Ok(Predictor::Horizontal),
            3 => Ok(Predictor::FloatingPoint),
            _ => Err(Error::Unsupported(format!("Predictor {}", value))),
        }
    }

    /// Reverses the predictor in place over a decoded chunk of `rows` rows,
    /// each `cols * samples_per_pixel` samples wide.
    pub fn apply(
        &self,
        chunk: &mut [u8],
        cols: usize,
        rows: usize,
        samples_per_pixel: usize,
        data_type: DataType,
        byte_order: ByteOrder,
    ) -> Result<()> {
        let sample_size = data_type.size();
        let row_len = cols * samples_per_pixel * sample_size;
        if row_len == 0 {
            return Ok(());
        }

        if chunk.len() < row_len * rows {
            return Err(Error::InvalidFormat(format!(
                "Predictor needs {} bytes, chunk has {}",
                row_len * rows,
                chunk.len()
            )));
        }

        match self {
            Predictor::None => {}
            Predictor::Horizontal => {
                for row in chunk.chunks_exact_mut(row_len).take(rows) {
                    undo_horizontal(row, samples_per_pixel, sample_size, byte_order)?;
                }
            }
            Predictor::FloatingPoint => {
                if !data_type.is_float() {
                    return Err(Error::Unsupported(format!(
                        "Floating point predictor on {} samples",
                        data_type.name()
                    )));
                }
                let mut scratch = vec![0u8; row_len];
                for row in chunk.chunks_exact_mut(row_len).take(rows) {
                    undo_floating_point(row, &mut scratch, samples_per_pixel, sample_size, byte_order);
                }
            }
        }

        Ok(())
    }
}

/// Accumulates each sample onto the sample one pixel to its left, with
/// wrapping arithmetic at the sample width.
fn undo_horizontal(
    row: &mut [u8],
    samples_per_pixel: usize,
    sample_size: usize,
    byte_order: ByteOrder,
) -> Result<()> {
    let stride = samples_per_pixel * sample_size;

    match sample_size {
        1 => {
            for i in stride..row.len() {
                row[i] = row[i].wrapping_add(row[i - stride]);
            }
        }
        2 => {
            for i in (stride..row.len()).step_by(2) {
                let sum = byte_order
                    .u16_at(&row[i..])
                    .wrapping_add(byte_order.u16_at(&row[i - stride..]));
                byte_order.put_u16(&mut row[i..], sum);
            }
        }
        4 => {
            for i in (stride..row.len()).step_by(4) {
                let sum = byte_order
                    .u32_at(&row[i..])
                    .wrapping_add(byte_order.u32_at(&row[i - stride..]));
                byte_order.put_u32(&mut row[i..], sum);
            }
        }
        8 => {
            for i in (stride..row.len()).step_by(8) {
                let sum = byte_order
                    .u64_at(&row[i..])
                    .wrapping_add(byte_order.u64_at(&row[i - stride..]));
                byte_order.put_u64(&mut row[i..], sum);
            }
        }
        other => {
            return Err(Error::Unsupported(format!(
                "Horizontal predictor on {}-byte samples",
                other
            )))
        }
    }

    Ok(())
}

/// Undoes byte differencing, then gathers the byte planes back into
/// samples. Planes are stored most significant byte first.
fn undo_floating_point(
    row: &mut [u8],
    scratch: &mut [u8],
    samples_per_pixel: usize,
    sample_size: usize,
    byte_order: ByteOrder,
) {
    for i in samples_per_pixel..row.len() {
        row[i] = row[i].wrapping_add(row[i - samples_per_pixel]);
    }

    scratch.copy_from_slice(row);
    let samples = row.len() / sample_size;

    for k in 0..samples {
        for b in 0..sample_size {
            let plane = match byte_order {
                ByteOrder::BigEndian => b,
                ByteOrder::LittleEndian => sample_size - b - 1,
            };
            row[sample_size * k + b] = scratch[plane * samples + k];
        }
    }
}
