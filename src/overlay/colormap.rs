//! Inverse red ramp
//!
//! Higher values become more transparent and darker: a sample at the range
//! maximum is fully transparent black, a sample at the minimum is opaque red.
//! Red and alpha always carry the same byte.

use rayon::prelude::*;

use super::range::{is_sentinel, ValueRange};

/// Color of sentinel pixels
pub const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Maps one sample to RGBA
pub fn ramp_pixel(value: f64, range: &ValueRange) -> [u8; 4] {
    if is_sentinel(value) {
        return TRANSPARENT;
    }

    let level = (range.normalize(value) * 255.0).round().clamp(0.0, 255.0) as u8;
    [level, 0, 0, level]
}

/// Maps every sample to RGBA, producing `samples.len() * 4` bytes
pub fn colorize(samples: &[f64], range: &ValueRange) -> Vec<u8> {
    let mut pixels = vec![0u8; samples.len() * 4];
    pixels
        .par_chunks_mut(4)
        .zip(samples.par_iter())
        .for_each(|(pixel, &value)| pixel.copy_from_slice(&ramp_pixel(value, range)));
    pixels
}
