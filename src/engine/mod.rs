//! The pipeline controller: owns the audio path, the worker threads, and
//! everything they share.

pub(crate) mod analysis;
pub(crate) mod buffer_manager;
pub mod params;
pub(crate) mod sync;
pub(crate) mod trigger;

use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::core::fft::COMPLEX_ZERO;
use crate::core::types::{PeakMap, Sample, FFT_SIZE};
use crate::core::wavetable::AnalysisWindow;
use crate::engine::analysis::CalculationEngine;
use crate::engine::buffer_manager::{BufferManager, SnapshotBuffer};
use crate::engine::params::{FxParameters, ParamStore};
use crate::engine::sync::SyncPrimitives;
use crate::engine::trigger::TriggerManager;
use crate::error::EngineError;
use crate::synth::bank::OscillatorBank;

/// The spectral resynthesis engine.
///
/// Embeds in a host that drives [`process_chunk`](Self::process_chunk) from
/// its realtime audio thread. Construction spawns the transform, retune, and
/// trigger workers; dropping the engine stops and joins them.
///
/// The audio-side methods take `&mut self` and belong to the audio thread
/// (or to setup code while playback is stopped, per their documented
/// preconditions). Parameter updates go through
/// [`update_parameters`](Self::update_parameters) or a cloned
/// [`EngineController`] from any thread.
#[derive(Debug)]
pub struct SpectralEngine {
    params: Arc<ParamStore>,
    bank: Arc<OscillatorBank>,
    analysis_sync: Arc<SyncPrimitives<SnapshotBuffer>>,
    retune_sync: Arc<SyncPrimitives<PeakMap>>,
    buffer_manager: BufferManager,
    // Workers join in their own Drop impls; the shared stop flag is set by
    // whichever drops first.
    calculation: CalculationEngine,
    trigger: TriggerManager,
    stop_workers: Arc<AtomicBool>,
}

impl SpectralEngine {
    /// Builds the engine with a Hann analysis window.
    pub fn new(sampling_freq: f64) -> Result<Self, EngineError> {
        Self::with_window(sampling_freq, AnalysisWindow::Hann)
    }

    /// Builds the engine with the given analysis window family.
    pub fn with_window(
        sampling_freq: f64,
        window: AnalysisWindow,
    ) -> Result<Self, EngineError> {
        let params = Arc::new(ParamStore::new(sampling_freq));
        let bank = Arc::new(OscillatorBank::new(sampling_freq));
        let snapshot: SnapshotBuffer = vec![COMPLEX_ZERO; FFT_SIZE].into_boxed_slice();
        let analysis_sync = Arc::new(SyncPrimitives::new(snapshot));
        let retune_sync = Arc::new(SyncPrimitives::new(PeakMap::new()));
        let stop_workers = Arc::new(AtomicBool::new(false));

        let buffer_manager = BufferManager::new(
            window,
            Arc::clone(&bank),
            Arc::clone(&params),
            Arc::clone(&analysis_sync),
        );
        let calculation = CalculationEngine::spawn(
            Arc::clone(&bank),
            Arc::clone(&params),
            Arc::clone(&analysis_sync),
            Arc::clone(&retune_sync),
            Arc::clone(&stop_workers),
        )?;
        let trigger = TriggerManager::spawn(
            Arc::clone(&retune_sync),
            Arc::clone(&params),
            Arc::clone(&stop_workers),
        )?;

        info!("spectral engine up at {sampling_freq} Hz");
        Ok(Self {
            params,
            bank,
            analysis_sync,
            retune_sync,
            buffer_manager,
            calculation,
            trigger,
            stop_workers,
        })
    }

    /// Adopts the host sampling frequency and clears all audio state.
    ///
    /// Must not run concurrently with [`process_chunk`](Self::process_chunk).
    pub fn prepare_to_play(&mut self, sampling_freq: f64) {
        self.params.set_sample_rate(sampling_freq);
        self.bank.reset(sampling_freq);
        self.buffer_manager.reset();
        self.clear_analysis_state();
        info!("prepared to play at {sampling_freq} Hz");
    }

    /// Applies one block of host parameters. Callable from any thread.
    pub fn update_parameters(&self, parameters: &FxParameters) {
        self.params.apply(parameters, &self.bank);
    }

    /// Replaces `samples` in place with the resynthesized signal.
    ///
    /// Audio-thread entry point: allocation-free and wait-free.
    pub fn process_chunk(&mut self, samples: &mut [Sample]) {
        self.buffer_manager.process_chunk(samples);
    }

    /// Clears the ring, silences the bank, and resets the output filter.
    ///
    /// Must not run concurrently with [`process_chunk`](Self::process_chunk).
    pub fn reset(&mut self) {
        self.bank.reset(self.params.sampling_freq());
        self.buffer_manager.reset();
        self.clear_analysis_state();
    }

    /// A cloneable handle for parameter updates from non-audio threads.
    pub fn controller(&self) -> EngineController {
        EngineController {
            params: Arc::clone(&self.params),
            bank: Arc::clone(&self.bank),
        }
    }

    /// The oscillator bank, for inspection.
    pub fn bank(&self) -> &OscillatorBank {
        &self.bank
    }

    /// A copy of the most recently published peak map.
    pub fn latest_peaks(&self) -> PeakMap {
        self.retune_sync.lock().clone()
    }

    /// True while no analysis or retune pass is in flight.
    pub fn analysis_idle(&self) -> bool {
        self.analysis_sync.action_done.load(Ordering::Acquire)
            && self.retune_sync.action_done.load(Ordering::Acquire)
    }

    /// Polls until the workers go idle or `timeout` elapses. Returns whether
    /// they settled. Intended for tests and offline rendering, not the audio
    /// thread.
    pub fn settle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if self.analysis_idle() {
                return true;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        self.analysis_idle()
    }

    fn clear_analysis_state(&self) {
        {
            let mut snapshot = self.analysis_sync.lock();
            snapshot.fill(COMPLEX_ZERO);
        }
        {
            let mut map = self.retune_sync.lock();
            map.clear();
        }
        self.analysis_sync.action_done.store(true, Ordering::Release);
        self.retune_sync.action_done.store(true, Ordering::Release);
    }

    /// Whether shutdown has been initiated. Mostly useful to assert teardown
    /// ordering in tests.
    pub fn stopping(&self) -> bool {
        self.stop_workers.load(Ordering::Acquire)
    }
}

/// Cloneable parameter endpoint detached from the engine's audio side.
#[derive(Debug, Clone)]
pub struct EngineController {
    params: Arc<ParamStore>,
    bank: Arc<OscillatorBank>,
}

impl EngineController {
    /// Applies one block of host parameters.
    pub fn update_parameters(&self, parameters: &FxParameters) {
        self.params.apply(parameters, &self.bank);
    }
}
