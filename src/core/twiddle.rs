//! Stage-indexed twiddle factor tables for the radix-2 transform.

use num_complex::Complex;
use std::f64::consts::PI;

use crate::core::types::{Sample, MAX_TWIDDLE_STAGES};

/// Precomputed complex exponentials `e^{-iπk/M}` for every butterfly stage.
///
/// Stage `s` holds `M = 2^s` entries, covering butterflies of width `2M`.
/// The butterfly consumes pairs of samples `M` apart, which is why the
/// half-form exponent `π k / M` is stored rather than `2π k / M`.
///
/// The selected stage is carried as state between `select` and `get`, so the
/// inner butterfly loop performs a plain indexed read.
#[derive(Debug)]
pub struct TwiddleLut {
    stages: Vec<Vec<Complex<Sample>>>,
    selected: usize,
}

impl TwiddleLut {
    pub fn new() -> Self {
        let stages = (0..MAX_TWIDDLE_STAGES)
            .map(|stage| {
                let m = 1usize << stage;
                (0..m)
                    .map(|k| {
                        let angle = -PI * k as f64 / m as f64;
                        Complex::new(angle.cos() as Sample, angle.sin() as Sample)
                    })
                    .collect()
            })
            .collect();
        Self { stages, selected: 0 }
    }

    /// Selects the stage whose factors subsequent `get` calls return.
    /// Out-of-range stages clamp to the last one.
    #[inline]
    pub fn select(&mut self, stage: usize) {
        self.selected = stage.min(MAX_TWIDDLE_STAGES - 1);
    }

    /// Returns factor `k` of the selected stage. `k` must be below the
    /// selected stage's length; the hot loop guarantees this by iterating
    /// `0..M/2` for butterfly width `M`.
    #[inline]
    pub fn get(&self, k: usize) -> Complex<Sample> {
        self.stages[self.selected][k]
    }

    /// Entry count of the selected stage.
    #[inline]
    pub fn stage_len(&self) -> usize {
        self.stages[self.selected].len()
    }
}

impl Default for TwiddleLut {
    fn default() -> Self {
        Self::new()
    }
}
