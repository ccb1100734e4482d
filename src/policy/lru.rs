//! Least Recently Used engine.
//!
//! A recency list (front = most recent) plus an index map from key to
//! list handle:
//!
//! ```text
//!   index: FxHashMap<K, NodeId> ──► list: [new] ◄──► ... ◄──► [old]
//!                                    front                     back
//! ```
//!
//! Reads move the node to the front; inserting a new key into a full
//! cache evicts the back node.

use std::hash::Hash;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::ds::{List, NodeId};

use super::{CacheEntry, EvictionEngine, Lookup};

#[derive(Debug)]
struct LruNode<K, V> {
    key: K,
    entry: CacheEntry<V>,
}

#[derive(Debug)]
pub(crate) struct LruCore<K, V> {
    index: FxHashMap<K, NodeId>,
    list: List<LruNode<K, V>>,
    capacity: usize,
}

impl<K, V> LruCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity + 1, Default::default()),
            list: List::with_capacity(capacity),
            capacity,
        }
    }

    fn evict_oldest(&mut self, evicted: &mut Vec<(K, V)>) {
        if let Some(node) = self.list.pop_back() {
            self.index.remove(&node.key);
            evicted.push((node.key, node.entry.value));
        }
    }
}

impl<K, V> EvictionEngine<K, V> for LruCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn insert(&mut self, key: K, value: V, expires_at: Option<Instant>, evicted: &mut Vec<(K, V)>) {
        if let Some(&id) = self.index.get(&key) {
            self.list.move_to_front(id);
            if let Some(node) = self.list.get_mut(id) {
                node.entry.value = value;
                if expires_at.is_some() {
                    node.entry.expires_at = expires_at;
                }
            }
            return;
        }

        if self.list.len() >= self.capacity {
            self.evict_oldest(evicted);
        }
        let id = self.list.push_front(LruNode {
            key: key.clone(),
            entry: CacheEntry::new(value, expires_at),
        });
        self.index.insert(key, id);
    }

    fn lookup(&mut self, key: &K, now: Instant) -> Lookup<V> {
        let id = match self.index.get(key) {
            Some(&id) => id,
            None => return Lookup::Miss,
        };
        let expired = match self.list.get(id) {
            Some(node) => node.entry.is_expired(now),
            None => return Lookup::Miss,
        };

        if expired {
            self.index.remove(key);
            return match self.list.remove(id) {
                Some(node) => Lookup::Expired(node.entry.value),
                None => Lookup::Miss,
            };
        }

        self.list.move_to_front(id);
        match self.list.get(id) {
            Some(node) => Lookup::Hit(node.entry.value.clone()),
            None => Lookup::Miss,
        }
    }

    fn peek_live(&self, key: &K, now: Instant) -> bool {
        self.index
            .get(key)
            .and_then(|&id| self.list.get(id))
            .is_some_and(|node| !node.entry.is_expired(now))
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.index.remove(key)?;
        self.list.remove(id).map(|node| node.entry.value)
    }

    fn drain(&mut self) -> Vec<(K, V)> {
        let mut drained = Vec::with_capacity(self.list.len());
        while let Some(node) = self.list.pop_back() {
            drained.push((node.key, node.entry.value));
        }
        self.index.clear();
        drained
    }

    fn keys(&self, now: Instant, check_expired: bool) -> Vec<K> {
        self.list
            .iter()
            .filter(|node| !check_expired || !node.entry.is_expired(now))
            .map(|node| node.key.clone())
            .collect()
    }

    fn snapshot(&self, now: Instant, check_expired: bool) -> Vec<(K, V)> {
        self.list
            .iter()
            .filter(|node| !check_expired || !node.entry.is_expired(now))
            .map(|node| (node.key.clone(), node.entry.value.clone()))
            .collect()
    }

    fn len(&self, now: Instant, check_expired: bool) -> usize {
        if !check_expired {
            return self.list.len();
        }
        self.list
            .iter()
            .filter(|node| !node.entry.is_expired(now))
            .count()
    }
}
