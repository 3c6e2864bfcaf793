//! Precomputed wavetables and analysis windows.
//!
//! Periodic tables feed the resynthesis oscillators; windowing tables shape
//! the analysis frames before the transform. Both are immutable after
//! construction.

use std::f64::consts::PI;

use crate::core::types::Sample;

/// Hamming window coefficients.
const HAMMING_A0: f64 = 0.54;
const HAMMING_A1: f64 = 0.46;

/// An immutable lookup table of power-of-two length.
///
/// Periodic tables are sampled over `[0, 2π)`; windowing tables are sampled
/// at integer index `0..size`. A periodic table used as an oscillator source
/// has its last entry equalized to its first, so a linear interpolator may
/// read `table[i + 1]` at `i = size - 2` and treat `size - 1` as the wrap
/// point without a modulo.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveTable {
    samples: Box<[Sample]>,
}

impl WaveTable {
    /// Builds a periodic table: entry `k` is `f(2π·k / size)`.
    ///
    /// # Panics
    ///
    /// Panics if `size` is not a power of two.
    pub fn periodic<F>(size: usize, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        assert!(size.is_power_of_two(), "wavetable size must be a power of two");
        let samples = (0..size)
            .map(|k| f(2.0 * PI * k as f64 / size as f64) as Sample)
            .collect();
        Self { samples }
    }

    /// Builds a windowing table: entry `k` is `f(k)`.
    ///
    /// # Panics
    ///
    /// Panics if `size` is not a power of two.
    pub fn windowing<F>(size: usize, f: F) -> Self
    where
        F: Fn(usize) -> f64,
    {
        assert!(size.is_power_of_two(), "window size must be a power of two");
        let samples = (0..size).map(|k| f(k) as Sample).collect();
        Self { samples }
    }

    /// Copies the first entry over the last, making the table endpoints
    /// bit-identical. Called exactly once on every periodic oscillator table.
    pub fn equalize_end_and_begin(&mut self) {
        if let [first, .., last] = &mut self.samples[..] {
            *last = *first;
        }
    }

    /// Bounds-checked read.
    #[inline]
    pub fn get(&self, index: usize) -> Option<Sample> {
        self.samples.get(index).copied()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Sample> + '_ {
        self.samples.iter().copied()
    }

    /// One period of a sine.
    pub fn sine(size: usize) -> Self {
        let mut table = Self::periodic(size, f64::sin);
        table.equalize_end_and_begin();
        table
    }

    /// Naive square: low half period at -1, high half at +1.
    pub fn square(size: usize) -> Self {
        let mut table = Self::periodic(size, |theta| if theta < PI { -1.0 } else { 1.0 });
        table.equalize_end_and_begin();
        table
    }

    /// Band-unlimited descending ramp spanning +1 to -1 over one period.
    pub fn saw(size: usize) -> Self {
        let mut table = Self::periodic(size, |theta| 1.0 - theta / PI);
        table.equalize_end_and_begin();
        table
    }

    /// Piecewise-linear triangle with peaks at ±1 on the quarter periods.
    pub fn triangle(size: usize) -> Self {
        let mut table = Self::periodic(size, |theta| {
            if theta < PI / 2.0 {
                theta / (PI / 2.0)
            } else if theta < 3.0 * PI / 2.0 {
                1.0 - (theta - PI / 2.0) / (PI / 2.0)
            } else {
                (theta - 3.0 * PI / 2.0) / (PI / 2.0) - 1.0
            }
        });
        table.equalize_end_and_begin();
        table
    }
}

impl std::ops::Index<usize> for WaveTable {
    type Output = Sample;

    #[inline]
    fn index(&self, index: usize) -> &Sample {
        &self.samples[index]
    }
}

/// Analysis window families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisWindow {
    Hann,
    Hamming,
    Bartlett,
}

impl AnalysisWindow {
    /// Generates the window table of the given power-of-two size.
    pub fn build(self, size: usize) -> WaveTable {
        let n = size as f64;
        match self {
            AnalysisWindow::Hann => WaveTable::windowing(size, |k| {
                0.5 * (1.0 - (2.0 * PI * k as f64 / (n - 1.0)).cos())
            }),
            AnalysisWindow::Hamming => WaveTable::windowing(size, |k| {
                HAMMING_A0 - HAMMING_A1 * (2.0 * PI * k as f64 / (n - 1.0)).cos()
            }),
            AnalysisWindow::Bartlett => WaveTable::windowing(size, |k| {
                let half = (n - 1.0) / 2.0;
                1.0 - ((k as f64 - half) / half).abs()
            }),
        }
    }

    /// Passband compensation pre-gain applied to samples entering the
    /// analysis ring, restoring roughly unity throughput under this window
    /// at 50% overlap. Empirical per window, not a global constant.
    #[inline]
    pub fn compensation(self) -> Sample {
        match self {
            AnalysisWindow::Hann => 1.2,
            AnalysisWindow::Hamming => 1.11,
            AnalysisWindow::Bartlett => 1.2,
        }
    }
}
