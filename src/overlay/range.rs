//! Value range of a raster and the ramp defined over it
//!
//! The color ramp and its inverse both go through [`ValueRange`], so the
//! consumer recovering values from the red channel uses the exact formula
//! the encoder used.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Returns true for the "no data" samples: exactly 0, NaN or infinite
pub fn is_sentinel(value: f64) -> bool {
    value == 0.0 || !value.is_finite()
}

/// Minimum and maximum over the non-sentinel samples of a raster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Scans the samples, skipping sentinels. Returns `None` when no sample
    /// qualifies.
    pub fn scan(samples: &[f64]) -> Option<Self> {
        samples
            .par_iter()
            .copied()
            .filter(|&v| !is_sentinel(v))
            .fold(
                || None,
                |acc: Option<ValueRange>, v| Some(acc.map_or(ValueRange::new(v, v), |r| r.include(v))),
            )
            .reduce(
                || None,
                |a, b| match (a, b) {
                    (Some(a), Some(b)) => Some(ValueRange::new(a.min.min(b.min), a.max.max(b.max))),
                    (a, None) => a,
                    (None, b) => b,
                },
            )
    }

    fn include(self, value: f64) -> Self {
        Self::new(self.min.min(value), self.max.max(value))
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Position of `value` on the inverse ramp: 0 at `max`, 1 at `min`.
    /// A flat range maps everything to 1.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.span();
        if span == 0.0 {
            1.0
        } else {
            (self.max - value) / span
        }
    }

    /// Inverse of [`normalize`](Self::normalize)
    pub fn denormalize(&self, t: f64) -> f64 {
        self.max - t * self.span()
    }

    /// Recovers an approximate sample value from an overlay pixel's red
    /// channel. Exact to within `span / 255`.
    pub fn value_from_red(&self, red: u8) -> f64 {
        self.denormalize(red as f64 / 255.0)
    }
}
