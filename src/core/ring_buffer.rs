//! Staging ring between the audio callback and the analysis thread.
//!
//! The audio thread streams samples into the real-valued input ring; once
//! per half window it publishes a windowed complex snapshot for the
//! transform. Keeping the live ring and the snapshot separate lets the
//! callback keep writing while the analysis thread works on stable data.

use num_complex::Complex;

use crate::core::fft::COMPLEX_ZERO;
use crate::core::types::{Sample, FFT_SIZE, HALF_FFT_SIZE};
use crate::core::wavetable::{AnalysisWindow, WaveTable};

/// Fixed-size input ring bound to an analysis window.
///
/// The cursor advances by one per sample and wraps at [`FFT_SIZE`]. Analysis
/// is due every [`HALF_FFT_SIZE`] samples (50% overlap).
#[derive(Debug)]
pub struct AnalysisRing {
    input: Box<[Sample]>,
    cursor: usize,
    window: WaveTable,
    compensation: Sample,
}

impl AnalysisRing {
    pub fn new(window_kind: AnalysisWindow) -> Self {
        Self {
            input: vec![0.0; FFT_SIZE].into_boxed_slice(),
            cursor: 0,
            window: window_kind.build(FFT_SIZE),
            compensation: window_kind.compensation(),
        }
    }

    /// Writes one sample at the cursor, pre-scaled by the window's passband
    /// compensation.
    #[inline]
    pub fn fill_input(&mut self, value: Sample) {
        self.input[self.cursor] = value * self.compensation;
    }

    /// Moves the cursor forward one slot. Returns `true` when it wraps
    /// through a half-window boundary, i.e. once per [`HALF_FFT_SIZE`]
    /// samples: the signal that a new analysis frame is due.
    #[inline]
    pub fn advance(&mut self) -> bool {
        self.cursor = (self.cursor + 1) & (FFT_SIZE - 1);
        self.cursor & (HALF_FFT_SIZE - 1) == 0
    }

    /// Publishes the windowed snapshot into `out`, each real sample carried
    /// over as a complex value with zero imaginary part.
    ///
    /// This is the only way audio-thread data reaches the analysis thread;
    /// the caller owns the handoff discipline around `out`.
    pub fn copy_to_output(&self, out: &mut [Complex<Sample>]) {
        debug_assert_eq!(out.len(), FFT_SIZE);
        for (k, slot) in out.iter_mut().enumerate() {
            *slot = Complex::new(self.input[k] * self.window[k], 0.0);
        }
    }

    /// Zeroes the ring and rewinds the cursor.
    pub fn clear(&mut self) {
        self.input.fill(0.0);
        self.cursor = 0;
    }

    #[inline]
    pub fn current_index(&self) -> usize {
        self.cursor
    }
}

/// Allocates a zeroed snapshot buffer of transform length.
pub fn snapshot_buffer() -> Box<[Complex<Sample>]> {
    vec![COMPLEX_ZERO; FFT_SIZE].into_boxed_slice()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_signals_on_half_window_boundaries() {
        let mut ring = AnalysisRing::new(AnalysisWindow::Hann);
        let mut signals = Vec::new();
        for i in 0..2 * FFT_SIZE {
            if ring.advance() {
                signals.push(i);
            }
        }
        // Once per HALF_FFT_SIZE samples, first at the half-window wrap.
        let expected: Vec<usize> = (0..4).map(|n| HALF_FFT_SIZE - 1 + n * HALF_FFT_SIZE).collect();
        assert_eq!(signals, expected);
    }

    #[test]
    fn cursor_wraps_at_full_window() {
        let mut ring = AnalysisRing::new(AnalysisWindow::Hann);
        for _ in 0..FFT_SIZE {
            ring.advance();
        }
        assert_eq!(ring.current_index(), 0);
    }

    #[test]
    fn fill_applies_compensation() {
        // Hann weight at index 0 is ~0, so probe a mid-buffer slot where the
        // window sits at its peak.
        let mut ring = AnalysisRing::new(AnalysisWindow::Hann);
        for _ in 0..FFT_SIZE / 2 {
            ring.advance();
        }
        ring.fill_input(1.0);
        let mut out = snapshot_buffer();
        ring.copy_to_output(&mut out);
        let expected = AnalysisWindow::Hann.compensation();
        assert!((out[FFT_SIZE / 2].re - expected).abs() < 0.02);
        assert_eq!(out[FFT_SIZE / 2].im, 0.0);
    }

    #[test]
    fn snapshot_is_windowed() {
        let mut ring = AnalysisRing::new(AnalysisWindow::Hann);
        for _ in 0..FFT_SIZE {
            ring.fill_input(1.0);
            ring.advance();
        }
        let mut out = snapshot_buffer();
        ring.copy_to_output(&mut out);
        // Window endpoints pull the snapshot to zero, the center to the
        // compensated level.
        assert!(out[0].re.abs() < 1e-5);
        assert!((out[FFT_SIZE / 2].re - AnalysisWindow::Hann.compensation()).abs() < 0.01);
    }

    #[test]
    fn clear_rewinds_and_zeroes() {
        let mut ring = AnalysisRing::new(AnalysisWindow::Hann);
        for _ in 0..100 {
            ring.fill_input(0.7);
            ring.advance();
        }
        ring.clear();
        assert_eq!(ring.current_index(), 0);
        let mut out = snapshot_buffer();
        ring.copy_to_output(&mut out);
        assert!(out.iter().all(|c| c.re == 0.0 && c.im == 0.0));
    }
}
