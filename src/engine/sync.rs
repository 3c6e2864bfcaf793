//! Condvar-based handoff between the audio thread and a worker.

use parking_lot::{Condvar, Mutex, MutexGuard};
use std::sync::atomic::{AtomicBool, Ordering};

/// One producer/consumer handoff: a mutex guarding the shared payload, the
/// condvar a worker sleeps on, and two flags.
///
/// `work_ready` is the wait condition: the producer raises it before
/// notifying, the consumer lowers it on wake, and spurious wakeups fall
/// through the predicate loop. `action_done` is the baton back to the
/// producer: lowered when work is handed over, raised by the consumer once
/// the payload may be overwritten again.
///
/// The audio thread only ever touches this type through [`try_publish`]
/// (a bounded `try_lock`, never a wait) and the `action_done` load, keeping
/// the realtime path free of blocking.
///
/// [`try_publish`]: SyncPrimitives::try_publish
#[derive(Debug)]
pub(crate) struct SyncPrimitives<T> {
    shared: Mutex<T>,
    cv: Condvar,
    work_ready: AtomicBool,
    pub(crate) action_done: AtomicBool,
}

impl<T> SyncPrimitives<T> {
    pub fn new(shared: T) -> Self {
        Self {
            shared: Mutex::new(shared),
            cv: Condvar::new(),
            work_ready: AtomicBool::new(false),
            action_done: AtomicBool::new(true),
        }
    }

    /// Blocks the calling worker until work is signalled or `stop` is set.
    ///
    /// Returns the payload guard with `work_ready` already lowered, or
    /// `None` on shutdown.
    pub fn wait_for_work(&self, stop: &AtomicBool) -> Option<MutexGuard<'_, T>> {
        let mut guard = self.shared.lock();
        while !self.work_ready.load(Ordering::Acquire) && !stop.load(Ordering::Acquire) {
            self.cv.wait(&mut guard);
        }
        if stop.load(Ordering::Acquire) {
            return None;
        }
        self.work_ready.store(false, Ordering::Release);
        Some(guard)
    }

    /// Non-blocking publication from the audio thread.
    ///
    /// Succeeds only when the consumer is parked in [`wait_for_work`] (the
    /// mutex is free while it waits); a consumer mid-transition simply makes
    /// this attempt fail and the caller retries at its next opportunity.
    /// On success the payload is filled, `action_done` is lowered, and the
    /// consumer is notified.
    pub fn try_publish<F>(&self, fill: F) -> bool
    where
        F: FnOnce(&mut T),
    {
        let Some(mut guard) = self.shared.try_lock() else {
            return false;
        };
        fill(&mut guard);
        self.action_done.store(false, Ordering::Release);
        self.work_ready.store(true, Ordering::Release);
        drop(guard);
        self.cv.notify_one();
        true
    }

    /// Raises `work_ready` and wakes the consumer. Used by the non-realtime
    /// signalling paths (continuous retune, timed trigger).
    pub fn signal(&self) {
        let guard = self.shared.lock();
        self.work_ready.store(true, Ordering::Release);
        drop(guard);
        self.cv.notify_one();
    }

    /// Wakes the consumer without raising work; used at shutdown so the
    /// worker re-checks its stop flag. Takes the mutex briefly so a worker
    /// between its predicate check and its wait cannot miss the notification.
    pub fn wake_all(&self) {
        let guard = self.shared.lock();
        drop(guard);
        self.cv.notify_all();
    }

    /// Locks the payload from a non-realtime context.
    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.shared.lock()
    }
}
