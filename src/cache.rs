//! The cache handle: public contract, lock discipline, and read-through
//! orchestration.
//!
//! One readers/writer lock guards the engine. Mutating operations and the
//! `get` lookup path (which reorders and lazily expires) take the write
//! lock; `has`, `keys`, `get_all` and `len` take the read lock. The lock
//! is never held across a loader, listener, or transform call: engines
//! report evictions into a deferred vector that is delivered after
//! release, `serialize` runs before the lock and `deserialize` after it.
//!
//! On a miss with a loader configured, the caller leaves the lock, enters
//! the single-flight group for the key, and either runs the loader or
//! waits for the in-progress call. The first caller inserts the loaded
//! value through the regular write path; waiters receive the loaded value
//! directly, so a concurrent eviction cannot turn a successful load into
//! a miss.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::RwLock;

use crate::builder::EvictionPolicy;
use crate::clock::Clock;
use crate::context::Context;
use crate::error::{CacheError, HookError};
use crate::policy::{Engine, EvictionEngine, Lookup};
use crate::single_flight::FlightGroup;
use crate::stats::CacheStats;

/// Loader invoked on a read-through miss: produces the value and an
/// optional TTL override for the inserted entry.
pub type Loader<K, V> =
    Arc<dyn Fn(&Context, &K) -> Result<(V, Option<Duration>), HookError> + Send + Sync>;

/// Observation callback (`on_added`, `on_evicted`, `on_purge_visit`).
pub type Listener<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

/// Value transform applied on writes (`serialize`) or reads
/// (`deserialize`).
pub type Transform<K, V> = Arc<dyn Fn(&K, V) -> Result<V, HookError> + Send + Sync>;

/// Sizes of the ARC engine's internal lists and its adaptation target.
///
/// Returned by [`Cache::arc_snapshot`]. The live lists always satisfy
/// `t1_len + t2_len <= size`, and all four together stay within
/// `2 * size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcSnapshot {
    /// Live keys seen once recently (recency list).
    pub t1_len: usize,
    /// Live keys seen twice or more recently (frequency list).
    pub t2_len: usize,
    /// Ghost keys recently evicted from T1.
    pub b1_len: usize,
    /// Ghost keys recently evicted from T2.
    pub b2_len: usize,
    /// Target size of T1; grows on B1 rehits, shrinks on B2 rehits.
    pub p: usize,
}

/// User-supplied hooks, all optional.
pub(crate) struct Hooks<K, V> {
    pub(crate) loader: Option<Loader<K, V>>,
    pub(crate) on_added: Option<Listener<K, V>>,
    pub(crate) on_evicted: Option<Listener<K, V>>,
    pub(crate) on_purge_visit: Option<Listener<K, V>>,
    pub(crate) serialize: Option<Transform<K, V>>,
    pub(crate) deserialize: Option<Transform<K, V>>,
}

struct Shared<K, V> {
    engine: RwLock<Engine<K, V>>,
    hooks: Hooks<K, V>,
    expiration: Option<Duration>,
    clock: Arc<dyn Clock>,
    stats: CacheStats,
    flights: FlightGroup<K, V>,
}

/// Thread-safe cache handle; clones share the same underlying cache.
pub struct Cache<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Clone for Cache<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<K, V> Cache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        engine: Engine<K, V>,
        hooks: Hooks<K, V>,
        expiration: Option<Duration>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine: RwLock::new(engine),
                hooks,
                expiration,
                clock,
                stats: CacheStats::default(),
                flights: FlightGroup::new(),
            }),
        }
    }

    /// Inserts or updates `key`, applying the default expiration when one
    /// is configured.
    pub fn set(&self, key: K, value: V) -> Result<(), CacheError> {
        self.store(key, value, None)
    }

    /// As [`set`](Self::set), but with an explicit time-to-live that wins
    /// over the configured default.
    pub fn set_with_expire(&self, key: K, value: V, ttl: Duration) -> Result<(), CacheError> {
        self.store(key, value, Some(ttl))
    }

    /// Returns the live value for `key`. On a miss with a loader
    /// configured, joins (or starts) the single flight for the key and
    /// waits for its outcome; otherwise returns
    /// [`CacheError::KeyNotFound`].
    pub fn get(&self, key: &K) -> Result<V, CacheError> {
        self.get_with_context(&Context::background(), key)
    }

    /// As [`get`](Self::get), threading `ctx` into the loader.
    pub fn get_with_context(&self, ctx: &Context, key: &K) -> Result<V, CacheError> {
        match self.lookup(key) {
            Err(CacheError::KeyNotFound) => self.load_waiting(ctx, key),
            other => other,
        }
    }

    /// Returns the live value for `key` without ever blocking on a load.
    /// A miss with a loader configured kicks off a detached load (unless
    /// one is already in flight) and reports `KeyNotFound` now; a later
    /// call observes the loaded value.
    pub fn get_if_present(&self, key: &K) -> Result<V, CacheError> {
        self.get_if_present_with_context(&Context::background(), key)
    }

    /// As [`get_if_present`](Self::get_if_present), threading `ctx` into
    /// the detached loader.
    pub fn get_if_present_with_context(&self, ctx: &Context, key: &K) -> Result<V, CacheError> {
        match self.lookup(key) {
            Err(CacheError::KeyNotFound) => {
                self.load_detached(ctx, key);
                Err(CacheError::KeyNotFound)
            },
            other => other,
        }
    }

    /// Whether `key` holds a live (non-expired) entry. Does not update
    /// ordering state or statistics.
    pub fn has(&self, key: &K) -> bool {
        let now = self.shared.clock.now();
        self.shared.engine.read().peek_live(key, now)
    }

    /// Removes `key`, firing `on_evicted` when an entry was present.
    /// Returns whether an entry was removed.
    pub fn remove(&self, key: &K) -> bool {
        let removed = {
            let mut engine = self.shared.engine.write();
            engine.remove(key)
        };
        match removed {
            Some(value) => {
                if let Some(on_evicted) = &self.shared.hooks.on_evicted {
                    on_evicted(key, &value);
                }
                true
            },
            None => false,
        }
    }

    /// Drops every entry after handing each one (expired included) to
    /// `on_purge_visit`. Purged entries do not fire `on_evicted`.
    pub fn purge(&self) {
        let drained = {
            let mut engine = self.shared.engine.write();
            engine.drain()
        };
        if let Some(visit) = &self.shared.hooks.on_purge_visit {
            for (key, value) in &drained {
                visit(key, value);
            }
        }
    }

    /// Snapshot of the keys, in no particular order. `check_expired`
    /// filters out entries that are past their deadline.
    pub fn keys(&self, check_expired: bool) -> Vec<K> {
        let now = self.shared.clock.now();
        self.shared.engine.read().keys(now, check_expired)
    }

    /// Snapshot of the cache contents. Values are returned as stored; the
    /// `deserialize` transform is not applied.
    pub fn get_all(&self, check_expired: bool) -> HashMap<K, V> {
        let now = self.shared.clock.now();
        self.shared
            .engine
            .read()
            .snapshot(now, check_expired)
            .into_iter()
            .collect()
    }

    /// Number of entries, optionally counting only live ones.
    pub fn len(&self, check_expired: bool) -> usize {
        let now = self.shared.clock.now();
        self.shared.engine.read().len(now, check_expired)
    }

    pub fn is_empty(&self) -> bool {
        self.len(false) == 0
    }

    /// The eviction policy this cache was built with.
    pub fn policy(&self) -> EvictionPolicy {
        self.shared.engine.read().policy()
    }

    /// Current sizes of the ARC engine's lists and its target, or `None`
    /// when the cache uses another policy.
    pub fn arc_snapshot(&self) -> Option<ArcSnapshot> {
        let engine = self.shared.engine.read();
        match &*engine {
            Engine::Arc(core) => Some(ArcSnapshot {
                t1_len: core.t1_len(),
                t2_len: core.t2_len(),
                b1_len: core.b1_len(),
                b2_len: core.b2_len(),
                p: core.p_value(),
            }),
            _ => None,
        }
    }

    pub fn hit_count(&self) -> u64 {
        self.shared.stats.hit_count()
    }

    pub fn miss_count(&self) -> u64 {
        self.shared.stats.miss_count()
    }

    pub fn lookup_count(&self) -> u64 {
        self.shared.stats.lookup_count()
    }

    pub fn hit_rate(&self) -> f64 {
        self.shared.stats.hit_rate()
    }

    /// Shared write path for `set`, `set_with_expire`, and loader-driven
    /// inserts. `ttl` resolution: an explicit argument wins, then the
    /// configured default, then no expiration.
    fn store(&self, key: K, value: V, ttl: Option<Duration>) -> Result<(), CacheError> {
        let shared = &self.shared;
        let stored = match &shared.hooks.serialize {
            Some(serialize) => serialize(&key, value).map_err(CacheError::serialize)?,
            None => value,
        };

        let expires_at = ttl
            .or(shared.expiration)
            .map(|ttl| shared.clock.now() + ttl);
        let added = shared.hooks.on_added.as_ref().map(|_| stored.clone());

        let mut evicted = Vec::new();
        {
            let mut engine = shared.engine.write();
            engine.insert(key.clone(), stored, expires_at, &mut evicted);
        }

        if let Some(on_evicted) = &shared.hooks.on_evicted {
            for (evicted_key, evicted_value) in &evicted {
                on_evicted(evicted_key, evicted_value);
            }
        }
        if let (Some(on_added), Some(value)) = (&shared.hooks.on_added, added) {
            on_added(&key, &value);
        }
        Ok(())
    }

    /// Engine lookup: updates ordering state and the hit/miss counters,
    /// removing expired entries as they are found.
    fn lookup(&self, key: &K) -> Result<V, CacheError> {
        let shared = &self.shared;
        let now = shared.clock.now();
        let outcome = {
            let mut engine = shared.engine.write();
            engine.lookup(key, now)
        };
        match outcome {
            Lookup::Hit(value) => {
                shared.stats.record_hit();
                match &shared.hooks.deserialize {
                    Some(deserialize) => deserialize(key, value).map_err(CacheError::deserialize),
                    None => Ok(value),
                }
            },
            Lookup::Expired(value) => {
                if let Some(on_evicted) = &shared.hooks.on_evicted {
                    on_evicted(key, &value);
                }
                shared.stats.record_miss();
                Err(CacheError::KeyNotFound)
            },
            Lookup::Miss => {
                shared.stats.record_miss();
                Err(CacheError::KeyNotFound)
            },
        }
    }

    /// Wait-mode read-through: one loader invocation per batch of
    /// concurrent misses, outcome broadcast to every waiter.
    fn load_waiting(&self, ctx: &Context, key: &K) -> Result<V, CacheError> {
        let loader = match &self.shared.hooks.loader {
            Some(loader) => loader.clone(),
            None => return Err(CacheError::KeyNotFound),
        };
        let (result, _called) = self
            .shared
            .flights
            .run(key.clone(), || self.run_loader(&loader, ctx, key));
        result
    }

    /// No-wait read-through: reserve the flight and run the loader on a
    /// detached thread. Does nothing when a load is already in progress.
    fn load_detached(&self, ctx: &Context, key: &K) {
        let loader = match &self.shared.hooks.loader {
            Some(loader) => loader.clone(),
            None => return,
        };
        let flight = match self.shared.flights.begin(key.clone()) {
            Some(flight) => flight,
            None => return,
        };

        let cache = self.clone();
        let ctx = ctx.clone();
        let task_key = key.clone();
        let task_flight = flight.clone();
        let spawned = thread::Builder::new()
            .name("loadcache-loader".into())
            .spawn(move || {
                let result = cache.run_loader(&loader, &ctx, &task_key);
                cache.shared.flights.finish(&task_key, &task_flight, result);
            });
        if let Err(err) = spawned {
            self.shared
                .flights
                .finish(key, &flight, Err(CacheError::loader(Box::new(err))));
        }
    }

    /// Runs the loader and inserts the value through the regular write
    /// path. Panics anywhere in the chain (loader or insert-path hooks)
    /// are caught so the flight always completes. Waiters receive the
    /// loaded value; a failed insert surfaces its error instead.
    fn run_loader(&self, loader: &Loader<K, V>, ctx: &Context, key: &K) -> Result<V, CacheError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let (value, ttl) = loader(ctx, key).map_err(CacheError::loader)?;
            self.store(key.clone(), value.clone(), ttl)?;
            Ok(value)
        }));
        match outcome {
            Ok(result) => result,
            Err(payload) => Err(CacheError::loader_panic(payload)),
        }
    }
}

impl<K, V> fmt::Debug for Cache<K, V>
where
    K: Clone + Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("policy", &self.policy().as_str())
            .field("len", &self.len(false))
            .finish_non_exhaustive()
    }
}
