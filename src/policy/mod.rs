//! Eviction engines and the contract they share.
//!
//! Each engine owns the entry records and the ordering structure for one
//! policy. Engines run entirely under the cache's lock and never invoke
//! user callbacks; evictions are reported back through a sink vector and
//! delivered by the cache after the lock is released.

pub(crate) mod arc;
pub(crate) mod lfu;
pub(crate) mod lru;
pub(crate) mod simple;

use std::hash::Hash;
use std::time::Instant;

use crate::builder::EvictionPolicy;

/// A stored value plus its optional absolute expiration.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
    pub(crate) value: V,
    pub(crate) expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    pub(crate) fn new(value: V, expires_at: Option<Instant>) -> Self {
        Self { value, expires_at }
    }

    /// An entry is live only while `now < expires_at`; entries without a
    /// deadline never expire.
    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if at <= now)
    }
}

/// Outcome of a policy lookup performed under the cache's write lock.
pub(crate) enum Lookup<V> {
    /// Live entry; recency/frequency bookkeeping has been updated.
    Hit(V),
    /// The entry had expired and has been removed; the caller owes an
    /// eviction notification and a miss count.
    Expired(V),
    Miss,
}

/// Contract shared by the four engines.
pub(crate) trait EvictionEngine<K, V> {
    /// Inserts or updates `key`. `expires_at = None` leaves an existing
    /// entry's deadline untouched (and makes a new entry immortal);
    /// `Some` always overwrites. Capacity evictions are pushed onto
    /// `evicted`.
    fn insert(&mut self, key: K, value: V, expires_at: Option<Instant>, evicted: &mut Vec<(K, V)>);

    /// Looks `key` up, updating ordering state on a hit and removing the
    /// entry on lazy expiry.
    fn lookup(&mut self, key: &K, now: Instant) -> Lookup<V>;

    /// Whether `key` holds a live entry. No ordering updates.
    fn peek_live(&self, key: &K, now: Instant) -> bool;

    /// Removes `key`, returning its value.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Removes every entry (expired included) and resets policy state.
    fn drain(&mut self) -> Vec<(K, V)>;

    fn keys(&self, now: Instant, check_expired: bool) -> Vec<K>;

    fn snapshot(&self, now: Instant, check_expired: bool) -> Vec<(K, V)>;

    fn len(&self, now: Instant, check_expired: bool) -> usize;
}

/// Sum type over the four engines, chosen at build time.
pub(crate) enum Engine<K, V> {
    Simple(simple::SimpleCore<K, V>),
    Lru(lru::LruCore<K, V>),
    Lfu(lfu::LfuCore<K, V>),
    Arc(arc::ArcCore<K, V>),
}

impl<K, V> Engine<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new(policy: EvictionPolicy, size: usize) -> Self {
        match policy {
            EvictionPolicy::Simple => Engine::Simple(simple::SimpleCore::new(size)),
            EvictionPolicy::Lru => Engine::Lru(lru::LruCore::new(size)),
            EvictionPolicy::Lfu => Engine::Lfu(lfu::LfuCore::new(size)),
            EvictionPolicy::Arc => Engine::Arc(arc::ArcCore::new(size)),
        }
    }

    pub(crate) fn policy(&self) -> EvictionPolicy {
        match self {
            Engine::Simple(_) => EvictionPolicy::Simple,
            Engine::Lru(_) => EvictionPolicy::Lru,
            Engine::Lfu(_) => EvictionPolicy::Lfu,
            Engine::Arc(_) => EvictionPolicy::Arc,
        }
    }
}

impl<K, V> EvictionEngine<K, V> for Engine<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn insert(&mut self, key: K, value: V, expires_at: Option<Instant>, evicted: &mut Vec<(K, V)>) {
        match self {
            Engine::Simple(core) => core.insert(key, value, expires_at, evicted),
            Engine::Lru(core) => core.insert(key, value, expires_at, evicted),
            Engine::Lfu(core) => core.insert(key, value, expires_at, evicted),
            Engine::Arc(core) => core.insert(key, value, expires_at, evicted),
        }
    }

    fn lookup(&mut self, key: &K, now: Instant) -> Lookup<V> {
        match self {
            Engine::Simple(core) => core.lookup(key, now),
            Engine::Lru(core) => core.lookup(key, now),
            Engine::Lfu(core) => core.lookup(key, now),
            Engine::Arc(core) => core.lookup(key, now),
        }
    }

    fn peek_live(&self, key: &K, now: Instant) -> bool {
        match self {
            Engine::Simple(core) => core.peek_live(key, now),
            Engine::Lru(core) => core.peek_live(key, now),
            Engine::Lfu(core) => core.peek_live(key, now),
            Engine::Arc(core) => core.peek_live(key, now),
        }
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        match self {
            Engine::Simple(core) => core.remove(key),
            Engine::Lru(core) => core.remove(key),
            Engine::Lfu(core) => core.remove(key),
            Engine::Arc(core) => core.remove(key),
        }
    }

    fn drain(&mut self) -> Vec<(K, V)> {
        match self {
            Engine::Simple(core) => core.drain(),
            Engine::Lru(core) => core.drain(),
            Engine::Lfu(core) => core.drain(),
            Engine::Arc(core) => core.drain(),
        }
    }

    fn keys(&self, now: Instant, check_expired: bool) -> Vec<K> {
        match self {
            Engine::Simple(core) => core.keys(now, check_expired),
            Engine::Lru(core) => core.keys(now, check_expired),
            Engine::Lfu(core) => core.keys(now, check_expired),
            Engine::Arc(core) => core.keys(now, check_expired),
        }
    }

    fn snapshot(&self, now: Instant, check_expired: bool) -> Vec<(K, V)> {
        match self {
            Engine::Simple(core) => core.snapshot(now, check_expired),
            Engine::Lru(core) => core.snapshot(now, check_expired),
            Engine::Lfu(core) => core.snapshot(now, check_expired),
            Engine::Arc(core) => core.snapshot(now, check_expired),
        }
    }

    fn len(&self, now: Instant, check_expired: bool) -> usize {
        match self {
            Engine::Simple(core) => core.len(now, check_expired),
            Engine::Lru(core) => core.len(now, check_expired),
            Engine::Lfu(core) => core.len(now, check_expired),
            Engine::Arc(core) => core.len(now, check_expired),
        }
    }
}
