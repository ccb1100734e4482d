//! Ordered key set: a recency list plus an index map.
//!
//! Backs the ARC engine's live lists (T1/T2) and ghost lists (B1/B2).
//! Keys only, no values; the front is the most recent position and
//! `pop_back` drops the oldest key. Unbounded: ARC prunes its lists
//! explicitly as part of the replacement algorithm.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use super::arena::NodeId;
use super::list::List;

#[derive(Debug)]
pub struct KeyList<K> {
    list: List<K>,
    index: FxHashMap<K, NodeId>,
}

impl<K> KeyList<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            list: List::new(),
            index: FxHashMap::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts `key` at the front, or moves it there when already present.
    pub fn push_front(&mut self, key: K) {
        if let Some(&id) = self.index.get(&key) {
            self.list.move_to_front(id);
            return;
        }
        let id = self.list.push_front(key.clone());
        self.index.insert(key, id);
    }

    /// Removes `key`; returns whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(id) => {
                self.list.remove(id);
                true
            },
            None => false,
        }
    }

    /// Drops and returns the oldest key.
    pub fn pop_back(&mut self) -> Option<K> {
        let key = self.list.pop_back()?;
        self.index.remove(&key);
        Some(key)
    }

    pub fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
    }
}

impl<K> Default for KeyList<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_front_promotes_existing_keys() {
        let mut keys = KeyList::new();
        keys.push_front("a");
        keys.push_front("b");
        keys.push_front("a");

        assert_eq!(keys.len(), 2);
        // "b" is now the oldest.
        assert_eq!(keys.pop_back(), Some("b"));
        assert_eq!(keys.pop_back(), Some("a"));
        assert_eq!(keys.pop_back(), None);
    }

    #[test]
    fn remove_by_key() {
        let mut keys = KeyList::new();
        keys.push_front(1);
        keys.push_front(2);
        keys.push_front(3);

        assert!(keys.remove(&2));
        assert!(!keys.remove(&2));
        assert!(!keys.contains(&2));
        assert_eq!(keys.len(), 2);

        assert_eq!(keys.pop_back(), Some(1));
        assert_eq!(keys.pop_back(), Some(3));
    }

    #[test]
    fn clear_empties_the_set() {
        let mut keys = KeyList::new();
        keys.push_front("x");
        keys.push_front("y");
        keys.clear();

        assert!(keys.is_empty());
        assert!(!keys.contains(&"x"));
        assert_eq!(keys.pop_back(), None);
    }
}
