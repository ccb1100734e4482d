//! Adaptive Replacement Cache engine.
//!
//! Balances recency and frequency with four ordered key lists and a
//! self-tuning target:
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────┐
//!   │  entries: FxHashMap<K, CacheEntry<V>>   (values for T1 ∪ T2) │
//!   │                                                              │
//!   │  T1  keys seen once recently      (live, recency)            │
//!   │  T2  keys seen twice or more      (live, frequency)          │
//!   │  B1  ghosts evicted from T1       (keys only)                │
//!   │  B2  ghosts evicted from T2       (keys only)                │
//!   │                                                              │
//!   │  p = target size of T1.  Ghost hit in B1 grows p (favor      │
//!   │  recency); ghost hit in B2 shrinks it (favor frequency).     │
//!   └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Invariants: `|T1| + |T2| <= size`, `|T1| + |B1| <= size`,
//! `|T1| + |T2| + |B1| + |B2| <= 2 * size`, and a key is in `entries`
//! iff it is in T1 or T2.

use std::hash::Hash;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::ds::KeyList;

use super::{CacheEntry, EvictionEngine, Lookup};

#[derive(Debug)]
pub(crate) struct ArcCore<K, V> {
    entries: FxHashMap<K, CacheEntry<V>>,
    t1: KeyList<K>,
    t2: KeyList<K>,
    b1: KeyList<K>,
    b2: KeyList<K>,
    /// Target size of T1.
    p: usize,
    capacity: usize,
}

impl<K, V> ArcCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity + 1, Default::default()),
            t1: KeyList::new(),
            t2: KeyList::new(),
            b1: KeyList::new(),
            b2: KeyList::new(),
            p: 0,
            capacity,
        }
    }

    /// Number of live keys seen once recently (recency list).
    pub(crate) fn t1_len(&self) -> usize {
        self.t1.len()
    }

    /// Number of live keys seen twice or more recently (frequency list).
    pub(crate) fn t2_len(&self) -> usize {
        self.t2.len()
    }

    /// Number of ghost keys recently evicted from T1.
    pub(crate) fn b1_len(&self) -> usize {
        self.b1.len()
    }

    /// Number of ghost keys recently evicted from T2.
    pub(crate) fn b2_len(&self) -> usize {
        self.b2.len()
    }

    /// Current target size for T1. Grows on B1 rehits (favoring recency)
    /// and shrinks on B2 rehits (favoring frequency).
    pub(crate) fn p_value(&self) -> usize {
        self.p
    }

    fn is_full(&self) -> bool {
        self.t1.len() + self.t2.len() == self.capacity
    }

    /// The suggested target only sticks while the live lists are full.
    fn set_target(&mut self, p: usize) {
        if self.is_full() {
            self.p = p;
        }
    }

    /// Evicts one live entry to make room, recording its key in the
    /// matching ghost list. No-op unless the live lists are at capacity.
    fn replace(&mut self, key: &K, evicted: &mut Vec<(K, V)>) {
        if !self.is_full() {
            return;
        }
        let from_t1 = self.t1.len() > 0
            && ((self.b2.contains(key) && self.t1.len() == self.p) || self.t1.len() > self.p)
            || self.t2.is_empty();
        let victim = if from_t1 {
            match self.t1.pop_back() {
                Some(old) => {
                    self.b1.push_front(old.clone());
                    old
                },
                None => return,
            }
        } else {
            match self.t2.pop_back() {
                Some(old) => {
                    self.b2.push_front(old.clone());
                    old
                },
                None => return,
            }
        };
        if let Some(entry) = self.entries.remove(&victim) {
            evicted.push((victim, entry.value));
        }
    }
}

impl<K, V> EvictionEngine<K, V> for ArcCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn insert(&mut self, key: K, value: V, expires_at: Option<Instant>, evicted: &mut Vec<(K, V)>) {
        match self.entries.get_mut(&key) {
            Some(entry) => {
                entry.value = value;
                if expires_at.is_some() {
                    entry.expires_at = expires_at;
                }
            },
            None => {
                self.entries
                    .insert(key.clone(), CacheEntry::new(value, expires_at));
            },
        }

        // Already resident: value updated, position unchanged.
        if self.t1.contains(&key) || self.t2.contains(&key) {
            return;
        }

        // Ghost hit in B1: lean towards recency.
        if self.b1.contains(&key) {
            let delta = (self.b2.len() / self.b1.len()).max(1);
            let target = (self.p + delta).min(self.capacity);
            self.set_target(target);
            self.replace(&key, evicted);
            self.b1.remove(&key);
            self.t2.push_front(key);
            return;
        }

        // Ghost hit in B2: lean towards frequency.
        if self.b2.contains(&key) {
            let delta = (self.b1.len() / self.b2.len()).max(1);
            let target = self.p.saturating_sub(delta);
            self.set_target(target);
            self.replace(&key, evicted);
            self.b2.remove(&key);
            self.t2.push_front(key);
            return;
        }

        // Brand new key.
        if self.t1.len() + self.b1.len() == self.capacity {
            if self.t1.len() < self.capacity {
                self.b1.pop_back();
                self.replace(&key, evicted);
            } else if let Some(old) = self.t1.pop_back() {
                // T1 fills the whole cache: drop its oldest entry outright.
                if let Some(entry) = self.entries.remove(&old) {
                    evicted.push((old, entry.value));
                }
            }
        } else {
            let total = self.t1.len() + self.t2.len() + self.b1.len() + self.b2.len();
            if total >= self.capacity {
                if total == 2 * self.capacity {
                    if self.b2.len() > 0 {
                        self.b2.pop_back();
                    } else {
                        self.b1.pop_back();
                    }
                }
                self.replace(&key, evicted);
            }
        }
        self.t1.push_front(key);
    }

    fn lookup(&mut self, key: &K, now: Instant) -> Lookup<V> {
        if self.t1.contains(key) {
            let expired = match self.entries.get(key) {
                Some(entry) => entry.is_expired(now),
                None => return Lookup::Miss,
            };
            self.t1.remove(key);
            if !expired {
                // Second touch: promote to the frequency list.
                self.t2.push_front(key.clone());
                return match self.entries.get(key) {
                    Some(entry) => Lookup::Hit(entry.value.clone()),
                    None => Lookup::Miss,
                };
            }
            self.b1.push_front(key.clone());
            return match self.entries.remove(key) {
                Some(entry) => Lookup::Expired(entry.value),
                None => Lookup::Miss,
            };
        }

        if self.t2.contains(key) {
            let expired = match self.entries.get(key) {
                Some(entry) => entry.is_expired(now),
                None => return Lookup::Miss,
            };
            if !expired {
                self.t2.push_front(key.clone());
                return match self.entries.get(key) {
                    Some(entry) => Lookup::Hit(entry.value.clone()),
                    None => Lookup::Miss,
                };
            }
            self.t2.remove(key);
            self.b2.push_front(key.clone());
            return match self.entries.remove(key) {
                Some(entry) => Lookup::Expired(entry.value),
                None => Lookup::Miss,
            };
        }

        Lookup::Miss
    }

    fn peek_live(&self, key: &K, now: Instant) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        if self.t1.remove(key) {
            let entry = self.entries.remove(key);
            self.b1.push_front(key.clone());
            return entry.map(|entry| entry.value);
        }
        if self.t2.remove(key) {
            let entry = self.entries.remove(key);
            self.b2.push_front(key.clone());
            return entry.map(|entry| entry.value);
        }
        None
    }

    fn drain(&mut self) -> Vec<(K, V)> {
        let drained = self
            .entries
            .drain()
            .map(|(key, entry)| (key, entry.value))
            .collect();
        self.t1.clear();
        self.t2.clear();
        self.b1.clear();
        self.b2.clear();
        self.p = 0;
        drained
    }

    fn keys(&self, now: Instant, check_expired: bool) -> Vec<K> {
        self.entries
            .iter()
            .filter(|(_, entry)| !check_expired || !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    fn snapshot(&self, now: Instant, check_expired: bool) -> Vec<(K, V)> {
        self.entries
            .iter()
            .filter(|(_, entry)| !check_expired || !entry.is_expired(now))
            .map(|(key, entry)| (key.clone(), entry.value.clone()))
            .collect()
    }

    fn len(&self, now: Instant, check_expired: bool) -> usize {
        if !check_expired {
            return self.entries.len();
        }
        self.entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }
}
