//! Unordered engine: a bare map with an optional capacity.
//!
//! `capacity == 0` means unbounded. When bounded and full, inserting a
//! new key evicts whichever entry the map yields first; reads never touch
//! ordering state because there is none.

use std::hash::Hash;
use std::time::Instant;

use rustc_hash::FxHashMap;

use super::{CacheEntry, EvictionEngine, Lookup};

#[derive(Debug)]
pub(crate) struct SimpleCore<K, V> {
    entries: FxHashMap<K, CacheEntry<V>>,
    capacity: usize,
}

impl<K, V> SimpleCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub(crate) fn new(capacity: usize) -> Self {
        let entries = if capacity > 0 {
            FxHashMap::with_capacity_and_hasher(capacity + 1, Default::default())
        } else {
            FxHashMap::default()
        };
        Self { entries, capacity }
    }

    fn evict_one(&mut self, evicted: &mut Vec<(K, V)>) {
        let victim = match self.entries.keys().next() {
            Some(key) => key.clone(),
            None => return,
        };
        if let Some(entry) = self.entries.remove(&victim) {
            evicted.push((victim, entry.value));
        }
    }
}

impl<K, V> EvictionEngine<K, V> for SimpleCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn insert(&mut self, key: K, value: V, expires_at: Option<Instant>, evicted: &mut Vec<(K, V)>) {
        if let Some(entry) = self.entries.get_mut(&key) {
            entry.value = value;
            if expires_at.is_some() {
                entry.expires_at = expires_at;
            }
            return;
        }
        if self.capacity > 0 && self.entries.len() >= self.capacity {
            self.evict_one(evicted);
        }
        self.entries.insert(key, CacheEntry::new(value, expires_at));
    }

    fn lookup(&mut self, key: &K, now: Instant) -> Lookup<V> {
        match self.entries.get(key) {
            None => return Lookup::Miss,
            Some(entry) if !entry.is_expired(now) => return Lookup::Hit(entry.value.clone()),
            Some(_) => {},
        }
        match self.entries.remove(key) {
            Some(entry) => Lookup::Expired(entry.value),
            None => Lookup::Miss,
        }
    }

    fn peek_live(&self, key: &K, now: Instant) -> bool {
        self.entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    fn drain(&mut self) -> Vec<(K, V)> {
        self.entries
            .drain()
            .map(|(key, entry)| (key, entry.value))
            .collect()
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn insert<K, V>(core: &mut SimpleCore<K, V>, key: K, value: V) -> Vec<(K, V)>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        let mut evicted = Vec::new();
        core.insert(key, value, None, &mut evicted);
        evicted
    }

    #[test]
    fn unbounded_when_capacity_is_zero() {
        let mut core = SimpleCore::new(0);
        for i in 0..1000 {
            assert!(insert(&mut core, i, i).is_empty());
        }
        assert_eq!(core.len(Instant::now(), false), 1000);
    }

    #[test]
    fn bounded_insert_evicts_one_arbitrary_entry() {
        let mut core = SimpleCore::new(2);
        insert(&mut core, "a", 1);
        insert(&mut core, "b", 2);

        let evicted = insert(&mut core, "c", 3);
        assert_eq!(evicted.len(), 1);
        assert_eq!(core.len(Instant::now(), false), 2);
        assert!(core.peek_live(&"c", Instant::now()));
    }

    #[test]
    fn update_in_place_does_not_evict() {
        let mut core = SimpleCore::new(2);
        insert(&mut core, "a", 1);
        insert(&mut core, "b", 2);

        let evicted = insert(&mut core, "a", 10);
        assert!(evicted.is_empty());

        match core.lookup(&"a", Instant::now()) {
            Lookup::Hit(v) => assert_eq!(v, 10),
            _ => panic!("expected hit"),
        }
    }

    #[test]
    fn expired_entries_are_removed_on_lookup() {
        let mut core = SimpleCore::new(0);
        let now = Instant::now();
        let mut evicted = Vec::new();
        core.insert("a", 1, Some(now + Duration::from_millis(10)), &mut evicted);

        let later = now + Duration::from_millis(20);
        assert!(!core.peek_live(&"a", later));
        assert!(matches!(core.lookup(&"a", later), Lookup::Expired(1)));
        // Entry is gone after the expired read.
        assert!(matches!(core.lookup(&"a", later), Lookup::Miss));
        assert_eq!(core.len(later, false), 0);
    }

    #[test]
    fn update_without_ttl_keeps_the_old_deadline() {
        let mut core = SimpleCore::new(0);
        let now = Instant::now();
        let mut evicted = Vec::new();
        core.insert("a", 1, Some(now + Duration::from_millis(10)), &mut evicted);
        core.insert("a", 2, None, &mut evicted);

        let later = now + Duration::from_millis(20);
        assert!(matches!(core.lookup(&"a", later), Lookup::Expired(2)));
    }

    #[test]
    fn drain_returns_everything_and_resets() {
        let mut core = SimpleCore::new(0);
        insert(&mut core, 1, 10);
        insert(&mut core, 2, 20);

        let mut drained = core.drain();
        drained.sort_unstable();
        assert_eq!(drained, vec![(1, 10), (2, 20)]);
        assert_eq!(core.len(Instant::now(), false), 0);
    }

    #[test]
    fn snapshots_filter_expired_on_request() {
        let mut core = SimpleCore::new(0);
        let now = Instant::now();
        let mut evicted = Vec::new();
        core.insert("live", 1, None, &mut evicted);
        core.insert("dead", 2, Some(now), &mut evicted);

        assert_eq!(core.keys(now, false).len(), 2);
        assert_eq!(core.keys(now, true), vec!["live"]);
        assert_eq!(core.len(now, true), 1);
        assert_eq!(core.snapshot(now, true), vec![("live", 1)]);
    }
}
