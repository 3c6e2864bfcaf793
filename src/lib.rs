#![forbid(unsafe_code)]
//! Real-time spectral resynthesis core.
//!
//! `spectral-resynth` replaces an audio stream with its own spectral
//! skeleton: input is windowed and Fourier-analyzed, the strongest peaks are
//! mapped onto a bank of wavetable oscillators, and the summed oscillator
//! output takes the input's place. The crate is the in-process DSP core of
//! such an effect — the host (a DAW plugin shell) delivers fixed-rate sample
//! chunks on its realtime thread and the engine fills them back in place,
//! with analysis and retuning running on their own worker threads so the
//! audio callback never blocks or allocates.
//!
//! # Quick start
//!
//! ```
//! use spectral_resynth::{FxParameters, SpectralEngine, Waveform};
//!
//! let mut engine = SpectralEngine::new(44100.0).unwrap();
//! engine.update_parameters(
//!     &FxParameters::default()
//!         .with_waveform(Waveform::Sine)
//!         .with_voices(4),
//! );
//!
//! // One second of 430.66 Hz sine, fed the way a host would.
//! let mut audio: Vec<f32> = (0..44100)
//!     .map(|i| (2.0 * std::f32::consts::PI * 430.66 * i as f32 / 44100.0).sin())
//!     .collect();
//! for chunk in audio.chunks_mut(512) {
//!     engine.process_chunk(chunk);
//! }
//! // `audio` now holds the resynthesized signal.
//! ```
//!
//! # Threads
//!
//! Construction spawns three workers: the transform worker (windowed FFT and
//! peak extraction, once per half analysis window), the retune worker
//! (mapping peaks onto oscillators), and the trigger worker (timed retune
//! gate for non-continuous mode). Dropping the engine stops and joins all of
//! them. Parameter changes are lock-free and may come from any thread via
//! [`EngineController`].

pub mod core;
pub mod engine;
pub mod error;
pub mod synth;

pub use crate::core::types::{
    BinMag, PeakMap, Sample, FFT_SIZE, HALF_FFT_SIZE, MAX_VOICES, WAVETABLE_SIZE,
};
pub use crate::core::wavetable::{AnalysisWindow, WaveTable};
pub use crate::engine::params::FxParameters;
pub use crate::engine::{EngineController, SpectralEngine};
pub use crate::error::EngineError;
pub use crate::synth::bank::Waveform;
