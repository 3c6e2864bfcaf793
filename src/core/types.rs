//! Core types shared across the crate: the sample scalar, fixed pipeline
//! sizes, and the spectral peak map.

/// A single audio sample (32-bit float, range -1.0 to 1.0).
pub type Sample = f32;

/// Analysis window length in samples. One spectral frame is produced per
/// `FFT_SIZE / 2` input samples (50% overlap).
pub const FFT_SIZE: usize = 1024;

/// Number of usable frequency bins of a real input transform.
pub const HALF_FFT_SIZE: usize = FFT_SIZE / 2;

/// Length of every oscillator wavetable.
pub const WAVETABLE_SIZE: usize = 256;

/// Capacity of the resynthesis oscillator bank.
pub const MAX_VOICES: usize = 46;

/// Number of twiddle stages the transform supports (stage `s` covers
/// butterfly width `2^(s+1)`, so ten stages bound `FFT_SIZE` at 1024).
pub const MAX_TWIDDLE_STAGES: usize = 10;

/// Floor for the spectral peak threshold. Bins quieter than this are never
/// reported regardless of the host setting.
pub const MIN_GAIN_THRESHOLD: Sample = 1e-4;

// The transform, the ring mask and the oscillator interpolation all rely on
// these being powers of two within the supported range.
const _: () = assert!(FFT_SIZE.is_power_of_two() && FFT_SIZE >= 16);
const _: () = assert!(FFT_SIZE <= 1 << MAX_TWIDDLE_STAGES);
const _: () = assert!(WAVETABLE_SIZE.is_power_of_two() && WAVETABLE_SIZE >= 16);
const _: () = assert!(MAX_VOICES <= HALF_FFT_SIZE);

/// One spectral peak: a frequency bin index paired with its magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinMag {
    /// Frequency bin `k`, corresponding to `k * fs / FFT_SIZE` Hz.
    pub bin: usize,
    /// Magnitude of that bin.
    pub magnitude: Sample,
}

impl BinMag {
    pub const ZERO: BinMag = BinMag {
        bin: 0,
        magnitude: 0.0,
    };
}

/// Spectral peak map published by the analysis thread.
///
/// The first `valid` entries are ordered by descending magnitude; entries past
/// `valid` are stale and must not be read.
#[derive(Debug, Clone)]
pub struct PeakMap {
    pub entries: Box<[BinMag]>,
    pub valid: usize,
}

impl PeakMap {
    pub fn new() -> Self {
        Self {
            entries: vec![BinMag::ZERO; HALF_FFT_SIZE].into_boxed_slice(),
            valid: 0,
        }
    }

    /// Returns the valid, magnitude-ordered prefix.
    #[inline]
    pub fn peaks(&self) -> &[BinMag] {
        &self.entries[..self.valid]
    }

    pub fn clear(&mut self) {
        self.valid = 0;
    }
}

impl Default for PeakMap {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peak_map_starts_empty() {
        let map = PeakMap::new();
        assert_eq!(map.entries.len(), HALF_FFT_SIZE);
        assert!(map.peaks().is_empty());
    }

    #[test]
    fn peak_map_valid_prefix() {
        let mut map = PeakMap::new();
        map.entries[0] = BinMag {
            bin: 10,
            magnitude: 3.0,
        };
        map.entries[1] = BinMag {
            bin: 6,
            magnitude: 1.5,
        };
        map.valid = 2;
        assert_eq!(map.peaks().len(), 2);
        assert_eq!(map.peaks()[0].bin, 10);
        map.clear();
        assert!(map.peaks().is_empty());
    }
}
