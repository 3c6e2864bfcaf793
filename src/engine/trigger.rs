//! Timed retune trigger for non-continuous tuning.

use log::debug;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::core::types::PeakMap;
use crate::engine::params::ParamStore;
use crate::engine::sync::SyncPrimitives;
use crate::error::EngineError;

/// Periodically releases the retune worker while continuous tuning is off.
///
/// The worker sleeps on a timed condvar wait so shutdown can interrupt it
/// immediately instead of waiting out the interval. In continuous mode the
/// ticks still fire but do nothing.
#[derive(Debug)]
pub(crate) struct TriggerManager {
    sleeper: Arc<(Mutex<()>, Condvar)>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl TriggerManager {
    pub fn spawn(
        retune_sync: Arc<SyncPrimitives<PeakMap>>,
        params: Arc<ParamStore>,
        stop: Arc<AtomicBool>,
    ) -> Result<Self, EngineError> {
        let sleeper = Arc::new((Mutex::new(()), Condvar::new()));
        let worker = {
            let sleeper = Arc::clone(&sleeper);
            let stop = Arc::clone(&stop);
            std::thread::Builder::new()
                .name("resynth-trigger".into())
                .spawn(move || trigger_loop(&sleeper, &retune_sync, &params, &stop))
                .map_err(EngineError::worker_spawn)?
        };
        debug!("trigger worker started");
        Ok(Self {
            sleeper,
            stop,
            worker: Some(worker),
        })
    }
}

impl Drop for TriggerManager {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        let (mutex, cv) = &*self.sleeper;
        let guard = mutex.lock();
        drop(guard);
        cv.notify_all();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
        debug!("trigger worker joined");
    }
}

fn trigger_loop(
    sleeper: &(Mutex<()>, Condvar),
    retune_sync: &SyncPrimitives<PeakMap>,
    params: &ParamStore,
    stop: &AtomicBool,
) {
    let (mutex, cv) = sleeper;
    let mut guard = mutex.lock();
    while !stop.load(Ordering::Acquire) {
        let interval = Duration::from_millis(u64::from(params.interval_ms()));
        let _ = cv.wait_for(&mut guard, interval);
        if stop.load(Ordering::Acquire) {
            break;
        }
        // Gate on the retune baton so ticks cannot pile up while a tuning
        // pass is still in flight.
        if !params.continuous() && retune_sync.action_done.load(Ordering::Acquire) {
            retune_sync.action_done.store(false, Ordering::Release);
            retune_sync.signal();
        }
    }
}
