//! The resynthesis oscillator bank.

use arc_swap::ArcSwap;
use atomic_float::{AtomicF32, AtomicF64};
use std::sync::atomic::Ordering::Relaxed;
use std::sync::Arc;

use crate::core::types::{PeakMap, Sample, FFT_SIZE, MAX_VOICES, WAVETABLE_SIZE};
use crate::core::wavetable::WaveTable;
use crate::synth::oscillator::Oscillator;

/// Rescales summed bin magnitudes back to sample amplitude.
const AMP_CORRECTION: Sample = 2.0 / FFT_SIZE as Sample;

/// Default glide length in samples; short enough to track the analysis rate,
/// long enough to suppress retune clicks at 44.1 kHz.
pub const DEFAULT_GLIDE_STEPS: u16 = 100;

/// Waveform the bank resynthesizes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Waveform {
    #[default]
    Sine,
    Triangle,
    Saw,
    Square,
}

/// Fixed bank of [`MAX_VOICES`] wavetable oscillators sharing one selected
/// waveform.
///
/// The audio thread sums voices via [`receive_output`](Self::receive_output);
/// the analysis thread maps spectral peaks onto voices via
/// [`tune_to_peaks`](Self::tune_to_peaks); the parameter thread may swap the
/// waveform at any time. The table pointer is read once per output sample.
pub struct OscillatorBank {
    oscillators: Box<[Oscillator]>,
    sine: Arc<WaveTable>,
    triangle: Arc<WaveTable>,
    saw: Arc<WaveTable>,
    square: Arc<WaveTable>,
    current: ArcSwap<WaveTable>,
    freq_resolution: AtomicF64,
    freq_offset: AtomicF32,
    glide_resolution: AtomicF32,
}

impl std::fmt::Debug for OscillatorBank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OscillatorBank")
            .field("voices", &self.oscillators.len())
            .field("freq_resolution", &self.freq_resolution)
            .field("freq_offset", &self.freq_offset)
            .field("glide_resolution", &self.glide_resolution)
            .finish()
    }
}

impl OscillatorBank {
    pub fn new(sampling_freq: f64) -> Self {
        let sine = Arc::new(WaveTable::sine(WAVETABLE_SIZE));
        let oscillators = (0..MAX_VOICES)
            .map(|_| Oscillator::new(sampling_freq))
            .collect();
        Self {
            oscillators,
            current: ArcSwap::from(Arc::clone(&sine)),
            sine,
            triangle: Arc::new(WaveTable::triangle(WAVETABLE_SIZE)),
            saw: Arc::new(WaveTable::saw(WAVETABLE_SIZE)),
            square: Arc::new(WaveTable::square(WAVETABLE_SIZE)),
            freq_resolution: AtomicF64::new(sampling_freq / FFT_SIZE as f64),
            freq_offset: AtomicF32::new(0.0),
            glide_resolution: AtomicF32::new(1.0 / DEFAULT_GLIDE_STEPS as Sample),
        }
    }

    /// Sums one output sample across all voices.
    ///
    /// Audio-thread hot path: no allocation, no locks, no transcendentals.
    #[inline]
    pub fn receive_output(&self) -> Sample {
        let table = self.current.load();
        let mut sum = 0.0;
        for osc in self.oscillators.iter() {
            sum += osc.step(&table);
        }
        AMP_CORRECTION * sum
    }

    /// Maps the strongest peaks onto the first `voices` oscillators and
    /// glides every remaining voice to silence.
    pub fn tune_to_peaks(&self, map: &PeakMap, voices: usize) {
        let active = voices.min(MAX_VOICES).min(map.valid);
        let resolution = self.freq_resolution.load(Relaxed);
        let offset = self.freq_offset.load(Relaxed);
        let glide = self.glide_resolution.load(Relaxed);

        for (osc, peak) in self.oscillators.iter().zip(map.peaks()).take(active) {
            let freq = (peak.bin as f64 * resolution) as Sample + offset;
            osc.tune_and_set_amp(freq, peak.magnitude, glide);
        }
        for osc in self.oscillators.iter().skip(active) {
            osc.tune_and_set_amp(0.0, 0.0, glide);
        }
    }

    /// Swaps every voice onto another waveform. Both tables share length and
    /// endpoint equalization, so a mid-phase swap stays in range.
    pub fn select_waveform(&self, waveform: Waveform) {
        let table = match waveform {
            Waveform::Sine => &self.sine,
            Waveform::Triangle => &self.triangle,
            Waveform::Saw => &self.saw,
            Waveform::Square => &self.square,
        };
        self.current.store(Arc::clone(table));
    }

    /// Sets the glide length in samples (floored at one).
    pub fn set_glide_steps(&self, steps: u16) {
        let steps = steps.max(1);
        self.glide_resolution
            .store(1.0 / steps as Sample, Relaxed);
    }

    /// Offset in Hz added to every retuned frequency before the Nyquist
    /// clamp.
    pub fn set_freq_offset(&self, offset: Sample) {
        self.freq_offset.store(offset, Relaxed);
    }

    /// Rewinds and silences every voice at a new sampling frequency.
    pub fn reset(&self, sampling_freq: f64) {
        self.freq_resolution
            .store(sampling_freq / FFT_SIZE as f64, Relaxed);
        for osc in self.oscillators.iter() {
            osc.reset(sampling_freq);
        }
    }

    /// Read access for tests and diagnostics.
    pub fn oscillator(&self, index: usize) -> &Oscillator {
        &self.oscillators[index]
    }
}
