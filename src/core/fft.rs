//! In-place radix-2 transform and spectral peak extraction.

use num_complex::Complex;

use crate::core::twiddle::TwiddleLut;
use crate::core::types::{BinMag, PeakMap, Sample, FFT_SIZE, MIN_GAIN_THRESHOLD};

/// Zero-valued complex sample, used for buffer initialization.
pub const COMPLEX_ZERO: Complex<Sample> = Complex::new(0.0, 0.0);

/// Forward Cooley–Tukey transform, in place.
///
/// `samples.len()` must be a power of two no larger than [`FFT_SIZE`];
/// larger inputs would exceed the twiddle stages the LUT carries.
///
/// The decimation-in-time schedule first permutes the input into
/// bit-reversed order, then runs `log2(n)` butterfly stages of widening
/// span, each reading its factors from one LUT stage.
pub fn fourier_transform(samples: &mut [Complex<Sample>], lut: &mut TwiddleLut) {
    let n = samples.len();
    debug_assert!(n.is_power_of_two() && (2..=FFT_SIZE).contains(&n));
    let bits = n.trailing_zeros() as usize;

    for j in 0..n {
        let mut r = 0usize;
        for s in 0..bits {
            r = (r << 1) | ((j >> s) & 1);
        }
        if j < r {
            samples.swap(j, r);
        }
    }

    let mut span = 2usize;
    let mut stage = 0usize;
    while span <= n {
        lut.select(stage);
        let half = span >> 1;
        for block in 0..(n / span) {
            let base = block * span;
            for k in 0..half {
                let tau = lut.get(k) * samples[base + k + half];
                samples[base + k + half] = samples[base + k] - tau;
                samples[base + k] += tau;
            }
        }
        stage += 1;
        span <<= 1;
    }
}

/// Scans the lower half-spectrum for peaks at or above `threshold` and
/// publishes them into `map`, strongest first.
///
/// The threshold is clamped into `[MIN_GAIN_THRESHOLD, n/2]` before use, so
/// a zero or negative host setting still floors out numerical noise.
pub fn extract_peaks(spectrum: &[Complex<Sample>], map: &mut PeakMap, threshold: Sample) {
    let half = spectrum.len() / 2;
    let threshold = threshold.clamp(MIN_GAIN_THRESHOLD, half as Sample);

    let mut valid = 0usize;
    for (bin, value) in spectrum.iter().take(half).enumerate() {
        let magnitude = value.norm();
        if magnitude >= threshold {
            map.entries[valid] = BinMag { bin, magnitude };
            valid += 1;
        }
    }

    map.entries[..valid].sort_unstable_by(|a, b| b.magnitude.total_cmp(&a.magnitude));
    map.valid = valid;
}
