//! Host-facing effect parameters and their shared atomic store.

use atomic_float::{AtomicF32, AtomicF64};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering::Relaxed};

use crate::core::types::{Sample, HALF_FFT_SIZE, MAX_VOICES, MIN_GAIN_THRESHOLD};
use crate::synth::bank::{OscillatorBank, Waveform, DEFAULT_GLIDE_STEPS};

/// Output gain ceiling.
const MAX_GAIN: Sample = 2.0;
/// Feedback must stay strictly below unity or the input loop diverges.
const MAX_FEEDBACK: Sample = 0.999;
/// Bounds for the triggered-retune period.
const MIN_INTERVAL_MS: u16 = 1;
const MAX_INTERVAL_MS: u16 = 5000;
/// Default triggered-retune period.
const DEFAULT_INTERVAL_MS: u16 = 500;

/// Everything the host can adjust at runtime.
///
/// All values are clamped into their documented ranges when applied; an
/// out-of-range setting is never an error.
#[derive(Debug, Clone, PartialEq)]
pub struct FxParameters {
    /// Waveform every voice resynthesizes with.
    pub waveform_selection: Waveform,
    /// Output one-pole lowpass cutoff in Hz, clamped into `(0, fs/2)`.
    pub filter_cutoff: Sample,
    /// Minimum bin magnitude to count as a spectral peak.
    pub fft_threshold: Sample,
    /// Hz added to every retuned frequency before the Nyquist clamp.
    pub frequency_offset: Sample,
    /// Output multiplier, clamped into `[0, 2]`.
    pub gain: Sample,
    /// Fraction of the previous output mixed back into the analysis input,
    /// clamped into `[0, 1)`.
    pub feedback: Sample,
    /// Samples a voice takes to reach a new frequency/amplitude target.
    pub glide_steps: u16,
    /// Number of active voices, clamped to the bank capacity.
    pub voices: usize,
    /// Hold the current oscillator mapping regardless of new analyses.
    pub freeze: bool,
    /// Retune after every analysis frame (`true`) or only on the timed
    /// trigger (`false`).
    pub continuous_tuning: bool,
    /// Triggered-mode retune period in ms, clamped into `[1, 5000]`.
    pub tune_interval_ms: u16,
}

impl Default for FxParameters {
    fn default() -> Self {
        Self {
            waveform_selection: Waveform::Sine,
            filter_cutoff: 18_000.0,
            fft_threshold: 0.01,
            frequency_offset: 0.0,
            gain: 1.0,
            feedback: 0.0,
            glide_steps: DEFAULT_GLIDE_STEPS,
            voices: MAX_VOICES,
            freeze: false,
            continuous_tuning: true,
            tune_interval_ms: DEFAULT_INTERVAL_MS,
        }
    }
}

impl FxParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_waveform(mut self, waveform: Waveform) -> Self {
        self.waveform_selection = waveform;
        self
    }

    pub fn with_voices(mut self, voices: usize) -> Self {
        self.voices = voices;
        self
    }

    pub fn with_threshold(mut self, threshold: Sample) -> Self {
        self.fft_threshold = threshold;
        self
    }

    pub fn with_gain(mut self, gain: Sample) -> Self {
        self.gain = gain;
        self
    }

    pub fn with_filter_cutoff(mut self, cutoff: Sample) -> Self {
        self.filter_cutoff = cutoff;
        self
    }

    pub fn with_continuous_tuning(mut self, continuous: bool) -> Self {
        self.continuous_tuning = continuous;
        self
    }

    pub fn with_tune_interval_ms(mut self, interval: u16) -> Self {
        self.tune_interval_ms = interval;
        self
    }

    pub fn with_freeze(mut self, freeze: bool) -> Self {
        self.freeze = freeze;
        self
    }
}

/// Clamped parameter values shared across the audio, analysis, and trigger
/// threads. One writer (the parameter thread), relaxed per-field reads.
#[derive(Debug)]
pub(crate) struct ParamStore {
    sampling_freq: AtomicF64,
    alpha: AtomicF32,
    cutoff: AtomicF32,
    gain: AtomicF32,
    feedback: AtomicF32,
    threshold: AtomicF32,
    voices: AtomicUsize,
    freeze: AtomicBool,
    continuous: AtomicBool,
    interval_ms: AtomicU16,
}

impl ParamStore {
    pub fn new(sampling_freq: f64) -> Self {
        let defaults = FxParameters::default();
        let store = Self {
            sampling_freq: AtomicF64::new(sampling_freq),
            alpha: AtomicF32::new(1.0),
            cutoff: AtomicF32::new(defaults.filter_cutoff),
            gain: AtomicF32::new(defaults.gain),
            feedback: AtomicF32::new(defaults.feedback),
            threshold: AtomicF32::new(defaults.fft_threshold),
            voices: AtomicUsize::new(defaults.voices),
            freeze: AtomicBool::new(defaults.freeze),
            continuous: AtomicBool::new(defaults.continuous_tuning),
            interval_ms: AtomicU16::new(defaults.tune_interval_ms),
        };
        store.set_cutoff(defaults.filter_cutoff);
        store
    }

    /// Applies one host parameter block, clamping every field at ingestion.
    /// Bank-side fields (waveform, glide, offset) go straight to the bank.
    pub fn apply(&self, params: &FxParameters, bank: &OscillatorBank) {
        bank.select_waveform(params.waveform_selection);
        bank.set_glide_steps(params.glide_steps.max(1));
        bank.set_freq_offset(params.frequency_offset);

        self.set_cutoff(params.filter_cutoff);
        self.gain.store(params.gain.clamp(0.0, MAX_GAIN), Relaxed);
        self.feedback
            .store(params.feedback.clamp(0.0, MAX_FEEDBACK), Relaxed);
        self.threshold.store(
            params
                .fft_threshold
                .clamp(MIN_GAIN_THRESHOLD, HALF_FFT_SIZE as Sample),
            Relaxed,
        );
        self.voices
            .store(params.voices.min(MAX_VOICES), Relaxed);
        self.freeze.store(params.freeze, Relaxed);
        self.continuous.store(params.continuous_tuning, Relaxed);
        self.interval_ms.store(
            params
                .tune_interval_ms
                .clamp(MIN_INTERVAL_MS, MAX_INTERVAL_MS),
            Relaxed,
        );
    }

    /// Re-derives the lowpass coefficient for the stored cutoff, clamped
    /// below the new Nyquist.
    pub fn set_sample_rate(&self, sampling_freq: f64) {
        self.sampling_freq.store(sampling_freq, Relaxed);
        self.set_cutoff(self.cutoff.load(Relaxed));
    }

    fn set_cutoff(&self, cutoff: Sample) {
        let fs = self.sampling_freq.load(Relaxed);
        let cutoff = (cutoff as f64).clamp(f64::MIN_POSITIVE, fs / 2.0 - 1.0);
        self.cutoff.store(cutoff as Sample, Relaxed);
        let alpha = 1.0 - (-std::f64::consts::TAU * cutoff / fs).exp();
        self.alpha.store(alpha as Sample, Relaxed);
    }

    #[inline]
    pub fn alpha(&self) -> Sample {
        self.alpha.load(Relaxed)
    }

    #[inline]
    pub fn gain(&self) -> Sample {
        self.gain.load(Relaxed)
    }

    #[inline]
    pub fn feedback(&self) -> Sample {
        self.feedback.load(Relaxed)
    }

    #[inline]
    pub fn threshold(&self) -> Sample {
        self.threshold.load(Relaxed)
    }

    #[inline]
    pub fn voices(&self) -> usize {
        self.voices.load(Relaxed)
    }

    #[inline]
    pub fn freeze(&self) -> bool {
        self.freeze.load(Relaxed)
    }

    #[inline]
    pub fn continuous(&self) -> bool {
        self.continuous.load(Relaxed)
    }

    #[inline]
    pub fn interval_ms(&self) -> u16 {
        self.interval_ms.load(Relaxed)
    }

    #[inline]
    pub fn sampling_freq(&self) -> f64 {
        self.sampling_freq.load(Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_clamps_out_of_range_values() {
        let store = ParamStore::new(44100.0);
        let bank = OscillatorBank::new(44100.0);
        let params = FxParameters {
            gain: 7.5,
            feedback: 1.5,
            fft_threshold: -3.0,
            voices: 10_000,
            tune_interval_ms: 0,
            ..FxParameters::default()
        };
        store.apply(&params, &bank);

        assert_eq!(store.gain(), MAX_GAIN);
        assert!(store.feedback() < 1.0);
        assert_eq!(store.threshold(), MIN_GAIN_THRESHOLD);
        assert_eq!(store.voices(), MAX_VOICES);
        assert_eq!(store.interval_ms(), MIN_INTERVAL_MS);
    }

    #[test]
    fn apply_is_idempotent() {
        let store = ParamStore::new(44100.0);
        let bank = OscillatorBank::new(44100.0);
        let params = FxParameters::default()
            .with_gain(0.8)
            .with_filter_cutoff(2_000.0)
            .with_voices(4);
        store.apply(&params, &bank);
        let snapshot = (store.alpha(), store.gain(), store.voices(), store.threshold());
        store.apply(&params, &bank);
        assert_eq!(
            snapshot,
            (store.alpha(), store.gain(), store.voices(), store.threshold())
        );
    }

    #[test]
    fn cutoff_tracks_sample_rate() {
        let store = ParamStore::new(44100.0);
        let bank = OscillatorBank::new(44100.0);
        store.apply(
            &FxParameters::default().with_filter_cutoff(30_000.0),
            &bank,
        );
        // 30 kHz exceeds Nyquist at 44.1 kHz; the stored cutoff is pulled
        // below it and alpha stays within (0, 1].
        let alpha_44 = store.alpha();
        assert!(alpha_44 > 0.0 && alpha_44 <= 1.0);

        store.set_sample_rate(96_000.0);
        let alpha_96 = store.alpha();
        assert!(alpha_96 > 0.0 && alpha_96 < alpha_44 + 1e-6);
    }

    #[test]
    fn default_interval_in_range() {
        let p = FxParameters::default();
        assert!((MIN_INTERVAL_MS..=MAX_INTERVAL_MS).contains(&p.tune_interval_ms));
    }
}
