//! Single wavetable oscillator with per-sample parameter glide.

use atomic_float::{AtomicF32, AtomicF64};
use std::sync::atomic::Ordering::Relaxed;

use crate::core::types::{Sample, WAVETABLE_SIZE};
use crate::core::wavetable::WaveTable;

/// Steps per sample the oscillator runs on. One less than the table length:
/// the final table entry duplicates the first, so interpolation may read
/// `table[i + 1]` without a wrap test.
const INTERNAL_SIZE: Sample = (WAVETABLE_SIZE - 1) as Sample;

/// One resynthesis voice.
///
/// The audio thread owns `phase` and integrates `increment`/`amplitude`
/// toward their glide limits; the analysis thread programs the glide
/// (deltas, limits, targets) on retune. Every shared field is an individual
/// atomic with a single writer, so no lock is needed on either side.
#[derive(Debug)]
pub struct Oscillator {
    phase: AtomicF32,
    increment: AtomicF32,
    amplitude: AtomicF32,

    increment_delta: AtomicF32,
    amplitude_delta: AtomicF32,
    increment_low: AtomicF32,
    increment_high: AtomicF32,
    amplitude_low: AtomicF32,
    amplitude_high: AtomicF32,

    // Last programmed targets, read only by the retune thread.
    increment_target: AtomicF32,
    amplitude_target: AtomicF32,

    sampling_freq: AtomicF64,
    nyquist_freq: AtomicF64,
    inv_sampling_freq: AtomicF64,
}

impl Oscillator {
    pub fn new(sampling_freq: f64) -> Self {
        Self {
            phase: AtomicF32::new(0.0),
            increment: AtomicF32::new(0.0),
            amplitude: AtomicF32::new(0.0),
            increment_delta: AtomicF32::new(0.0),
            amplitude_delta: AtomicF32::new(0.0),
            increment_low: AtomicF32::new(0.0),
            increment_high: AtomicF32::new(0.0),
            amplitude_low: AtomicF32::new(0.0),
            amplitude_high: AtomicF32::new(0.0),
            increment_target: AtomicF32::new(0.0),
            amplitude_target: AtomicF32::new(0.0),
            sampling_freq: AtomicF64::new(sampling_freq),
            nyquist_freq: AtomicF64::new(sampling_freq / 2.0),
            inv_sampling_freq: AtomicF64::new(1.0 / sampling_freq),
        }
    }

    /// Produces one interpolated output sample and advances the phase.
    ///
    /// Called once per sample per voice on the audio thread. The table must
    /// be [`WAVETABLE_SIZE`] long with equalized endpoints.
    #[inline]
    pub fn step(&self, table: &WaveTable) -> Sample {
        let phase = self.phase.load(Relaxed);
        let index = phase as usize;
        let a = table[index];
        let b = table[index + 1];
        let output = a + (phase - index as Sample) * (b - a);

        let mut increment = self.increment.load(Relaxed);
        let mut next_phase = phase + increment;
        if next_phase >= INTERNAL_SIZE {
            next_phase -= INTERNAL_SIZE;
        }
        self.phase.store(next_phase, Relaxed);

        increment = (increment + self.increment_delta.load(Relaxed)).clamp(
            self.increment_low.load(Relaxed),
            self.increment_high.load(Relaxed),
        );
        self.increment.store(increment, Relaxed);

        let amplitude = (self.amplitude.load(Relaxed) + self.amplitude_delta.load(Relaxed)).clamp(
            self.amplitude_low.load(Relaxed),
            self.amplitude_high.load(Relaxed),
        );
        self.amplitude.store(amplitude, Relaxed);

        output * amplitude
    }

    /// Programs a glide toward `freq` (Hz, Nyquist-clamped) and `amplitude`.
    ///
    /// `glide_resolution` is the reciprocal of the glide step count. The
    /// clamp limit on the moving side becomes the new target so the
    /// per-sample integration lands exactly and cannot overshoot; the
    /// opposite limit keeps its previous value.
    pub fn tune_and_set_amp(&self, freq: Sample, amplitude: Sample, glide_resolution: Sample) {
        let nyquist = self.nyquist_freq.load(Relaxed);
        let freq = (freq as f64).clamp(0.0, nyquist);
        let increment =
            (INTERNAL_SIZE as f64 * freq * self.inv_sampling_freq.load(Relaxed)) as Sample;

        let increment_prev = self.increment_target.load(Relaxed);
        let amplitude_prev = self.amplitude_target.load(Relaxed);

        self.increment_delta
            .store((increment - increment_prev) * glide_resolution, Relaxed);
        self.amplitude_delta
            .store((amplitude - amplitude_prev) * glide_resolution, Relaxed);

        if increment >= increment_prev {
            self.increment_high.store(increment, Relaxed);
        } else {
            self.increment_low.store(increment, Relaxed);
        }
        if amplitude >= amplitude_prev {
            self.amplitude_high.store(amplitude, Relaxed);
        } else {
            self.amplitude_low.store(amplitude, Relaxed);
        }

        self.increment_target.store(increment, Relaxed);
        self.amplitude_target.store(amplitude, Relaxed);
    }

    /// Rewinds the phase and silences the voice at a new sampling frequency.
    pub fn reset(&self, sampling_freq: f64) {
        self.phase.store(0.0, Relaxed);
        self.increment.store(0.0, Relaxed);
        self.amplitude.store(0.0, Relaxed);
        self.increment_delta.store(0.0, Relaxed);
        self.amplitude_delta.store(0.0, Relaxed);
        self.increment_low.store(0.0, Relaxed);
        self.increment_high.store(0.0, Relaxed);
        self.amplitude_low.store(0.0, Relaxed);
        self.amplitude_high.store(0.0, Relaxed);
        self.increment_target.store(0.0, Relaxed);
        self.amplitude_target.store(0.0, Relaxed);
        self.sampling_freq.store(sampling_freq, Relaxed);
        self.nyquist_freq.store(sampling_freq / 2.0, Relaxed);
        self.inv_sampling_freq.store(1.0 / sampling_freq, Relaxed);
    }

    /// Current per-sample table increment.
    #[inline]
    pub fn increment(&self) -> Sample {
        self.increment.load(Relaxed)
    }

    /// Current amplitude.
    #[inline]
    pub fn amplitude(&self) -> Sample {
        self.amplitude.load(Relaxed)
    }

    /// The increment the current glide is heading toward.
    #[inline]
    pub fn increment_target(&self) -> Sample {
        self.increment_target.load(Relaxed)
    }
}

/// Converts an oscillator increment back to Hz at the given sampling rate.
pub fn increment_to_freq(increment: Sample, sampling_freq: f64) -> f64 {
    increment as f64 * sampling_freq / INTERNAL_SIZE as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    const FS: f64 = 44100.0;

    fn sine() -> WaveTable {
        WaveTable::sine(WAVETABLE_SIZE)
    }

    #[test]
    fn silent_by_default() {
        let osc = Oscillator::new(FS);
        let table = sine();
        for _ in 0..64 {
            assert_eq!(osc.step(&table), 0.0);
        }
    }

    #[test]
    fn glide_reaches_target_within_step_count() {
        let osc = Oscillator::new(FS);
        let table = sine();
        let steps = 100u32;
        osc.tune_and_set_amp(440.0, 0.5, 1.0 / steps as Sample);
        for _ in 0..steps {
            osc.step(&table);
        }
        let expected = (INTERNAL_SIZE as f64 * 440.0 / FS) as Sample;
        assert!((osc.increment() - expected).abs() < 1e-4);
        assert!((osc.amplitude() - 0.5).abs() < 1e-5);
    }

    #[test]
    fn glide_never_overshoots() {
        let osc = Oscillator::new(FS);
        let table = sine();
        osc.tune_and_set_amp(1000.0, 1.0, 0.01);
        let up_target = (INTERNAL_SIZE as f64 * 1000.0 / FS) as Sample;
        for _ in 0..500 {
            osc.step(&table);
            assert!(osc.increment() <= up_target + 1e-6);
            assert!(osc.amplitude() <= 1.0 + 1e-6);
        }
        // Glide back down; must not undershoot the new target.
        osc.tune_and_set_amp(200.0, 0.2, 0.01);
        let down_target = (INTERNAL_SIZE as f64 * 200.0 / FS) as Sample;
        for _ in 0..500 {
            osc.step(&table);
            assert!(osc.increment() >= down_target - 1e-6);
            assert!(osc.amplitude() >= 0.2 - 1e-6);
        }
        assert!((osc.increment() - down_target).abs() < 1e-4);
    }

    #[test]
    fn tune_clamps_to_nyquist() {
        let osc = Oscillator::new(FS);
        osc.tune_and_set_amp(100_000.0, 1.0, 1.0);
        let nyquist_increment = (INTERNAL_SIZE as f64 * (FS / 2.0) / FS) as Sample;
        assert!((osc.increment_target() - nyquist_increment).abs() < 1e-3);
    }

    #[test]
    fn output_frequency_matches_tuning() {
        let osc = Oscillator::new(FS);
        let table = sine();
        // Jump straight to the target: one glide step.
        osc.tune_and_set_amp(441.0, 1.0, 1.0);
        osc.step(&table);

        let n = 44100usize;
        let rendered: Vec<Sample> = (0..n).map(|_| osc.step(&table)).collect();
        let crossings = rendered
            .windows(2)
            .filter(|w| w[0] <= 0.0 && w[1] > 0.0)
            .count();
        // One second of samples: positive crossings approximate Hz.
        assert!((crossings as f64 - 441.0).abs() < 3.0, "got {crossings}");
    }

    #[test]
    fn reset_silences_and_rewinds() {
        let osc = Oscillator::new(FS);
        let table = sine();
        osc.tune_and_set_amp(440.0, 1.0, 1.0);
        for _ in 0..32 {
            osc.step(&table);
        }
        osc.reset(48000.0);
        assert_eq!(osc.increment(), 0.0);
        assert_eq!(osc.amplitude(), 0.0);
        assert_eq!(osc.step(&table), 0.0);
    }

    #[test]
    fn increment_freq_round_trip() {
        let inc = (INTERNAL_SIZE as f64 * 440.0 / FS) as Sample;
        assert!((increment_to_freq(inc, FS) - 440.0).abs() < 1e-3);
    }
}
