//! The audio-thread half of the pipeline.

use num_complex::Complex;
use std::sync::Arc;

use crate::core::ring_buffer::AnalysisRing;
use crate::core::types::Sample;
use crate::core::wavetable::AnalysisWindow;
use crate::engine::params::ParamStore;
use crate::engine::sync::SyncPrimitives;
use crate::synth::bank::OscillatorBank;

pub(crate) type SnapshotBuffer = Box<[Complex<Sample>]>;

/// Streams host chunks through the analysis ring and replaces them with the
/// resynthesized bank output.
///
/// Owns the input ring outright — no other thread touches it. Everything it
/// shares (bank, parameters, the snapshot handoff) is reached through
/// lock-free reads or a bounded `try_lock`.
#[derive(Debug)]
pub(crate) struct BufferManager {
    ring: AnalysisRing,
    bank: Arc<OscillatorBank>,
    params: Arc<ParamStore>,
    analysis: Arc<SyncPrimitives<SnapshotBuffer>>,
    previous_sample: Sample,
    want_fft: bool,
}

impl BufferManager {
    pub fn new(
        window: AnalysisWindow,
        bank: Arc<OscillatorBank>,
        params: Arc<ParamStore>,
        analysis: Arc<SyncPrimitives<SnapshotBuffer>>,
    ) -> Self {
        Self {
            ring: AnalysisRing::new(window),
            bank,
            params,
            analysis,
            previous_sample: 0.0,
            want_fft: false,
        }
    }

    /// Replaces `samples` in place with filtered oscillator output while
    /// staging the input (plus feedback) for analysis.
    ///
    /// A half-window wrap latches `want_fft`; the snapshot is published at
    /// the first wrap where the analysis worker is idle again. A wrap that
    /// lands while the worker is still busy is dropped, never queued —
    /// staleness stays bounded at one window.
    pub fn process_chunk(&mut self, samples: &mut [Sample]) {
        let alpha = self.params.alpha();
        let gain = self.params.gain();
        let feedback = self.params.feedback();

        for sample in samples.iter_mut() {
            self.ring
                .fill_input(*sample + feedback * self.previous_sample);
            self.previous_sample = (1.0 - alpha) * self.previous_sample
                + alpha * self.bank.receive_output() * gain;
            *sample = self.previous_sample;

            if self.ring.advance() {
                self.want_fft = true;
            }
            if self.want_fft
                && self.analysis.action_done.load(std::sync::atomic::Ordering::Acquire)
            {
                let ring = &self.ring;
                if self.analysis.try_publish(|out| ring.copy_to_output(out)) {
                    self.want_fft = false;
                }
            }
        }
    }

    /// Clears the ring, the filter state, and any pending analysis latch.
    pub fn reset(&mut self) {
        self.ring.clear();
        self.previous_sample = 0.0;
        self.want_fft = false;
    }

    #[cfg(test)]
    pub fn ring_index(&self) -> usize {
        self.ring.current_index()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{FFT_SIZE, HALF_FFT_SIZE};

    fn manager() -> BufferManager {
        let params = Arc::new(ParamStore::new(44100.0));
        BufferManager::new(
            AnalysisWindow::Hann,
            Arc::new(OscillatorBank::new(44100.0)),
            params,
            Arc::new(SyncPrimitives::new(
                vec![Complex::new(0.0, 0.0); FFT_SIZE].into_boxed_slice(),
            )),
        )
    }

    #[test]
    fn output_length_equals_input_length() {
        let mut bm = manager();
        let mut chunk = vec![0.25; 300];
        bm.process_chunk(&mut chunk);
        assert_eq!(chunk.len(), 300);
    }

    #[test]
    fn silent_bank_replaces_input_with_zero() {
        let mut bm = manager();
        let mut chunk = vec![0.9; 512];
        bm.process_chunk(&mut chunk);
        assert!(chunk.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn short_chunk_does_not_publish() {
        let mut bm = manager();
        let mut chunk = vec![0.5; HALF_FFT_SIZE - 1];
        bm.process_chunk(&mut chunk);
        // No wrap yet: the handoff still reports the last analysis done.
        assert!(bm
            .analysis
            .action_done
            .load(std::sync::atomic::Ordering::Acquire));
        assert_eq!(bm.ring_index(), HALF_FFT_SIZE - 1);
    }

    #[test]
    fn wrap_publishes_exactly_once_while_worker_busy() {
        let bm = manager();
        let analysis = Arc::clone(&bm.analysis);
        let mut bm = bm;

        let mut chunk = vec![0.5; FFT_SIZE * 2];
        bm.process_chunk(&mut chunk);
        // First wrap published and lowered the baton; with no worker to
        // raise it again, later wraps must be skipped, not queued.
        assert!(!analysis.action_done.load(std::sync::atomic::Ordering::Acquire));
    }

    #[test]
    fn reset_clears_filter_state() {
        let mut bm = manager();
        let mut chunk = vec![1.0; 64];
        bm.process_chunk(&mut chunk);
        bm.reset();
        assert_eq!(bm.ring_index(), 0);
        let mut silent = vec![0.0; 64];
        bm.process_chunk(&mut silent);
        assert!(silent.iter().all(|&s| s == 0.0));
    }
}
