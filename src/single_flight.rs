//! Single-flight coordination for read-through loads.
//!
//! Coalesces concurrent loads of the same key onto one invocation and
//! broadcasts the shared outcome.
//!
//! ```text
//!   calls: Mutex<FxHashMap<K, Arc<Flight<V>>>>
//!
//!   caller A (miss on k) ──► no record ──► register flight, run loader
//!   caller B (miss on k) ──► record ────► wait on flight.done
//!   caller C (miss on k) ──► record ────► wait on flight.done
//!
//!   loader returns ──► flight completed once ──► record removed
//!                      A returns its own result, B and C clones of it
//! ```
//!
//! The table mutex is never held while a loader runs or while a waiter
//! blocks; waiters synchronize on the per-flight slot and condvar only.

use std::hash::Hash;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use rustc_hash::FxHashMap;

use crate::error::CacheError;

/// One in-progress load: a result slot plus its completion signal.
pub(crate) struct Flight<V> {
    slot: Mutex<Option<Result<V, CacheError>>>,
    done: Condvar,
}

impl<V: Clone> Flight<V> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            done: Condvar::new(),
        }
    }

    /// Blocks until the flight completes and returns a clone of its
    /// outcome.
    fn wait(&self) -> Result<V, CacheError> {
        let mut slot = self.slot.lock();
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            self.done.wait(&mut slot);
        }
    }

    /// Stores the outcome and wakes every waiter. Only the first call has
    /// any effect.
    fn complete(&self, result: Result<V, CacheError>) {
        let mut slot = self.slot.lock();
        if slot.is_none() {
            *slot = Some(result);
            self.done.notify_all();
        }
    }
}

/// Table of in-progress loads, one per key.
pub(crate) struct FlightGroup<K, V> {
    calls: Mutex<FxHashMap<K, Arc<Flight<V>>>>,
}

impl<K, V> FlightGroup<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(FxHashMap::default()),
        }
    }

    /// Wait-mode entry point. Joins the in-progress flight for `key` if
    /// one exists; otherwise registers a flight, runs `load`, and
    /// broadcasts its result. Returns the shared outcome and whether this
    /// caller ran the load.
    pub(crate) fn run(
        &self,
        key: K,
        load: impl FnOnce() -> Result<V, CacheError>,
    ) -> (Result<V, CacheError>, bool) {
        let (flight, owner) = {
            let mut calls = self.calls.lock();
            match calls.get(&key) {
                Some(existing) => (existing.clone(), false),
                None => {
                    let flight = Arc::new(Flight::new());
                    calls.insert(key.clone(), flight.clone());
                    (flight, true)
                },
            }
        };

        if !owner {
            return (flight.wait(), false);
        }

        let result = load();
        self.finish(&key, &flight, result.clone());
        (result, true)
    }

    /// No-wait reservation. Registers and returns a flight for `key`, or
    /// `None` when a load is already in progress.
    pub(crate) fn begin(&self, key: K) -> Option<Arc<Flight<V>>> {
        let mut calls = self.calls.lock();
        if calls.contains_key(&key) {
            return None;
        }
        let flight = Arc::new(Flight::new());
        calls.insert(key, flight.clone());
        Some(flight)
    }

    /// Completes a flight registered by [`run`](Self::run) or
    /// [`begin`](Self::begin) and drops it from the table.
    pub(crate) fn finish(&self, key: &K, flight: &Flight<V>, result: Result<V, CacheError>) {
        flight.complete(result);
        self.calls.lock().remove(key);
    }

    #[cfg(test)]
    fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}
