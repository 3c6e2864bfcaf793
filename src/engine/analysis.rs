//! The analysis-thread half of the pipeline: transform and retune workers.

use log::{debug, trace};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crate::core::fft::{extract_peaks, fourier_transform};
use crate::core::twiddle::TwiddleLut;
use crate::core::types::PeakMap;
use crate::engine::buffer_manager::SnapshotBuffer;
use crate::engine::params::ParamStore;
use crate::engine::sync::SyncPrimitives;
use crate::error::EngineError;
use crate::synth::bank::OscillatorBank;

/// Owns the transform worker and the retune worker.
///
/// The transform worker turns each published snapshot into a peak map; the
/// retune worker maps the latest peaks onto the oscillator bank, either on
/// the transform worker's heels (continuous mode) or on the external
/// trigger. Both park on their own condvar and treat spurious wakeups as
/// no-ops.
#[derive(Debug)]
pub(crate) struct CalculationEngine {
    analysis_sync: Arc<SyncPrimitives<SnapshotBuffer>>,
    retune_sync: Arc<SyncPrimitives<PeakMap>>,
    stop: Arc<AtomicBool>,
    fft_worker: Option<JoinHandle<()>>,
    tune_worker: Option<JoinHandle<()>>,
}

impl CalculationEngine {
    pub fn spawn(
        bank: Arc<OscillatorBank>,
        params: Arc<ParamStore>,
        analysis_sync: Arc<SyncPrimitives<SnapshotBuffer>>,
        retune_sync: Arc<SyncPrimitives<PeakMap>>,
        stop: Arc<AtomicBool>,
    ) -> Result<Self, EngineError> {
        let fft_worker = {
            let analysis_sync = Arc::clone(&analysis_sync);
            let retune_sync = Arc::clone(&retune_sync);
            let params = Arc::clone(&params);
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name("resynth-fft".into())
                .spawn(move || fft_loop(&analysis_sync, &retune_sync, &params, &stop))
                .map_err(EngineError::worker_spawn)?
        };

        let tune_worker = {
            let retune_sync = Arc::clone(&retune_sync);
            let params = Arc::clone(&params);
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name("resynth-tune".into())
                .spawn(move || tune_loop(&retune_sync, &bank, &params, &stop))
                .map_err(EngineError::worker_spawn)?
        };

        debug!("analysis workers started");
        Ok(Self {
            analysis_sync,
            retune_sync,
            stop,
            fft_worker: Some(fft_worker),
            tune_worker: Some(tune_worker),
        })
    }
}

impl Drop for CalculationEngine {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.analysis_sync.wake_all();
        self.retune_sync.wake_all();
        if let Some(worker) = self.fft_worker.take() {
            let _ = worker.join();
        }
        if let Some(worker) = self.tune_worker.take() {
            let _ = worker.join();
        }
        debug!("analysis workers joined");
    }
}

fn fft_loop(
    analysis_sync: &SyncPrimitives<SnapshotBuffer>,
    retune_sync: &SyncPrimitives<PeakMap>,
    params: &ParamStore,
    stop: &AtomicBool,
) {
    let mut lut = TwiddleLut::new();
    while let Some(mut snapshot) = analysis_sync.wait_for_work(stop) {
        fourier_transform(&mut snapshot, &mut lut);
        {
            let mut map = retune_sync.lock();
            extract_peaks(&snapshot, &mut map, params.threshold());
            trace!("analysis frame published, {} peaks", map.valid);
        }
        drop(snapshot);

        if params.continuous() {
            // Lower the retune baton before signalling so an observer never
            // sees the analysis finished but the bank not yet retuned.
            retune_sync.action_done.store(false, Ordering::Release);
            retune_sync.signal();
        }
        analysis_sync.action_done.store(true, Ordering::Release);
    }
}

fn tune_loop(
    retune_sync: &SyncPrimitives<PeakMap>,
    bank: &OscillatorBank,
    params: &ParamStore,
    stop: &AtomicBool,
) {
    while let Some(map) = retune_sync.wait_for_work(stop) {
        if !params.freeze() {
            bank.tune_to_peaks(&map, params.voices());
        }
        drop(map);
        retune_sync.action_done.store(true, Ordering::Release);
    }
}
