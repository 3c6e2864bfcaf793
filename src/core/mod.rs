//! Core data path: types, tables, the transform, and the staging ring.

pub mod fft;
pub mod ring_buffer;
pub mod twiddle;
pub mod types;
pub mod wavetable;

pub use ring_buffer::AnalysisRing;
pub use twiddle::TwiddleLut;
pub use types::*;
pub use wavetable::{AnalysisWindow, WaveTable};
