//! Least Frequently Used engine.
//!
//! Entries live in buckets keyed by access count; the buckets form an
//! ordered ladder from the smallest populated count upward, and each
//! bucket keeps its entries in insertion order (front = newest):
//!
//! ```text
//!   min_freq ─► bucket(1) ◄──► bucket(3) ◄──► bucket(7)
//!               [e, d]         [b]            [a, c]
//!                  ▲ tail = oldest at that count
//! ```
//!
//! A hit moves the entry from bucket `f` to bucket `f + 1`, creating it
//! next to `f` if absent and dropping `f` when it empties. Eviction takes
//! the tail (oldest) entry of the smallest bucket.

use std::hash::Hash;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::ds::{Arena, NodeId};

use super::{CacheEntry, EvictionEngine, Lookup};

#[derive(Debug)]
struct LfuNode<K, V> {
    key: K,
    entry: CacheEntry<V>,
    freq: u64,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

#[derive(Debug)]
struct Bucket {
    head: Option<NodeId>,
    tail: Option<NodeId>,
    /// Next-smaller populated frequency.
    below: Option<u64>,
    /// Next-larger populated frequency.
    above: Option<u64>,
}

#[derive(Debug)]
pub(crate) struct LfuCore<K, V> {
    nodes: Arena<LfuNode<K, V>>,
    index: FxHashMap<K, NodeId>,
    buckets: FxHashMap<u64, Bucket>,
    /// Smallest populated frequency; 0 when the cache is empty.
    min_freq: u64,
    capacity: usize,
}

impl<K, V> LfuCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            nodes: Arena::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity + 1, Default::default()),
            buckets: FxHashMap::default(),
            min_freq: 0,
            capacity,
        }
    }

    fn link_bucket(&mut self, freq: u64, below: Option<u64>, above: Option<u64>) {
        self.buckets.insert(
            freq,
            Bucket {
                head: None,
                tail: None,
                below,
                above,
            },
        );
        if let Some(bucket) = below.and_then(|f| self.buckets.get_mut(&f)) {
            bucket.above = Some(freq);
        }
        if let Some(bucket) = above.and_then(|f| self.buckets.get_mut(&f)) {
            bucket.below = Some(freq);
        }
    }

    fn drop_bucket_if_empty(&mut self, freq: u64) {
        let (empty, below, above) = match self.buckets.get(&freq) {
            Some(bucket) => (bucket.head.is_none(), bucket.below, bucket.above),
            None => return,
        };
        if !empty {
            return;
        }
        self.buckets.remove(&freq);
        if let Some(bucket) = below.and_then(|f| self.buckets.get_mut(&f)) {
            bucket.above = above;
        }
        if let Some(bucket) = above.and_then(|f| self.buckets.get_mut(&f)) {
            bucket.below = below;
        }
        if self.min_freq == freq {
            self.min_freq = above.unwrap_or(0);
        }
    }

    /// Puts `id` at the front of `freq`'s bucket and stamps the node.
    fn push_front_in_bucket(&mut self, freq: u64, id: NodeId) {
        let head = self.buckets.get(&freq).and_then(|bucket| bucket.head);
        if let Some(node) = self.nodes.get_mut(id) {
            node.freq = freq;
            node.prev = None;
            node.next = head;
        }
        if let Some(node) = head.and_then(|h| self.nodes.get_mut(h)) {
            node.prev = Some(id);
        }
        if let Some(bucket) = self.buckets.get_mut(&freq) {
            bucket.head = Some(id);
            if bucket.tail.is_none() {
                bucket.tail = Some(id);
            }
        }
    }

    /// Unlinks `id` from `freq`'s bucket chain without freeing the node.
    fn unlink(&mut self, freq: u64, id: NodeId) {
        let (prev, next) = match self.nodes.get(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };
        match prev {
            Some(prev_id) => {
                if let Some(node) = self.nodes.get_mut(prev_id) {
                    node.next = next;
                }
            },
            None => {
                if let Some(bucket) = self.buckets.get_mut(&freq) {
                    bucket.head = next;
                }
            },
        }
        match next {
            Some(next_id) => {
                if let Some(node) = self.nodes.get_mut(next_id) {
                    node.prev = prev;
                }
            },
            None => {
                if let Some(bucket) = self.buckets.get_mut(&freq) {
                    bucket.tail = prev;
                }
            },
        }
        if let Some(node) = self.nodes.get_mut(id) {
            node.prev = None;
            node.next = None;
        }
    }

    /// Moves `id` from its bucket to the next-higher one.
    fn bump(&mut self, id: NodeId) {
        let freq = match self.nodes.get(id) {
            Some(node) => node.freq,
            None => return,
        };
        if freq == u64::MAX {
            // Saturated: refresh position within the bucket.
            self.unlink(freq, id);
            self.push_front_in_bucket(freq, id);
            return;
        }
        let next_freq = freq + 1;
        let (below, above) = match self.buckets.get(&freq) {
            Some(bucket) => (bucket.below, bucket.above),
            None => return,
        };

        self.unlink(freq, id);
        let emptied = self
            .buckets
            .get(&freq)
            .map_or(false, |bucket| bucket.head.is_none());
        if emptied {
            self.drop_bucket_if_empty(freq);
        }

        if !self.buckets.contains_key(&next_freq) {
            let below = if emptied { below } else { Some(freq) };
            self.link_bucket(next_freq, below, above);
        }
        self.push_front_in_bucket(next_freq, id);
        if self.min_freq == 0 || next_freq < self.min_freq {
            self.min_freq = next_freq;
        }
    }

    /// Unlinks and frees `id`, dropping its bucket when that empties it.
    fn detach(&mut self, id: NodeId) -> Option<LfuNode<K, V>> {
        let freq = self.nodes.get(id)?.freq;
        self.unlink(freq, id);
        self.drop_bucket_if_empty(freq);
        let node = self.nodes.remove(id)?;
        self.index.remove(&node.key);
        Some(node)
    }

    fn evict_least_frequent(&mut self, evicted: &mut Vec<(K, V)>) {
        if self.min_freq == 0 {
            return;
        }
        let victim = match self.buckets.get(&self.min_freq).and_then(|b| b.tail) {
            Some(id) => id,
            None => return,
        };
        if let Some(node) = self.detach(victim) {
            evicted.push((node.key, node.entry.value));
        }
    }
}

impl<K, V> EvictionEngine<K, V> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn insert(&mut self, key: K, value: V, expires_at: Option<Instant>, evicted: &mut Vec<(K, V)>) {
        if let Some(&id) = self.index.get(&key) {
            // Frequency is untouched by updates.
            if let Some(node) = self.nodes.get_mut(id) {
                node.entry.value = value;
                if expires_at.is_some() {
                    node.entry.expires_at = expires_at;
                }
            }
            return;
        }

        if self.index.len() >= self.capacity {
            self.evict_least_frequent(evicted);
        }

        let id = self.nodes.insert(LfuNode {
            key: key.clone(),
            entry: CacheEntry::new(value, expires_at),
            freq: 1,
            prev: None,
            next: None,
        });
        self.index.insert(key, id);
        if !self.buckets.contains_key(&1) {
            let above = if self.min_freq == 0 {
                None
            } else {
                Some(self.min_freq)
            };
            self.link_bucket(1, None, above);
        }
        self.push_front_in_bucket(1, id);
        self.min_freq = 1;
    }

    fn lookup(&mut self, key: &K, now: Instant) -> Lookup<V> {
        let id = match self.index.get(key) {
            Some(&id) => id,
            None => return Lookup::Miss,
        };
        let expired = match self.nodes.get(id) {
            Some(node) => node.entry.is_expired(now),
            None => return Lookup::Miss,
        };

        if expired {
            return match self.detach(id) {
                Some(node) => Lookup::Expired(node.entry.value),
                None => Lookup::Miss,
            };
        }

        self.bump(id);
        match self.nodes.get(id) {
            Some(node) => Lookup::Hit(node.entry.value.clone()),
            None => Lookup::Miss,
        }
    }

    fn peek_live(&self, key: &K, now: Instant) -> bool {
        self.index
            .get(key)
            .and_then(|&id| self.nodes.get(id))
            .is_some_and(|node| !node.entry.is_expired(now))
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let id = *self.index.get(key)?;
        self.detach(id).map(|node| node.entry.value)
    }

    fn drain(&mut self) -> Vec<(K, V)> {
        let ids: Vec<NodeId> = self.index.values().copied().collect();
        let mut drained = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(node) = self.nodes.remove(id) {
                drained.push((node.key, node.entry.value));
            }
        }
        self.nodes.clear();
        self.index.clear();
        self.buckets.clear();
        self.min_freq = 0;
        drained
    }

    fn keys(&self, now: Instant, check_expired: bool) -> Vec<K> {
        self.nodes
            .iter()
            .filter(|(_, node)| !check_expired || !node.entry.is_expired(now))
            .map(|(_, node)| node.key.clone())
            .collect()
    }

    fn snapshot(&self, now: Instant, check_expired: bool) -> Vec<(K, V)> {
        self.nodes
            .iter()
            .filter(|(_, node)| !check_expired || !node.entry.is_expired(now))
            .map(|(_, node)| (node.key.clone(), node.entry.value.clone()))
            .collect()
    }

    fn len(&self, now: Instant, check_expired: bool) -> usize {
        if !check_expired {
            return self.index.len();
        }
        self.nodes
            .iter()
            .filter(|(_, node)| !node.entry.is_expired(now))
            .count()
    }
}
