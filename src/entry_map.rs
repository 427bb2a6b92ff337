//! An insertion-ordered map keyed by entry hash. Plain `HashMap`s don't
//! promise iteration order, and this log's traversal, `values()`, and JSON
//! rendering all depend on stable, deterministic iteration — so a hash map is
//! paired with a parallel `Vec` of keys in first-insertion order.

use crate::block_store::Hash;
use crate::entry::Entry;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct OrderedMap<V> {
    keys: Vec<Hash>,
    map: HashMap<Hash, V>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        OrderedMap {
            keys: Vec::new(),
            map: HashMap::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> OrderedMap<V> {
        OrderedMap::default()
    }

    pub fn get(&self, key: &Hash) -> Option<&V> {
        self.map.get(key)
    }

    /// Inserts or replaces `value` at `key`. A key's position in iteration
    /// order is fixed by its *first* `set`; a later `set` on the same key
    /// replaces the value in place without moving it.
    pub fn set(&mut self, key: Hash, value: V) {
        if !self.map.contains_key(&key) {
            self.keys.push(key);
        }
        self.map.insert(key, value);
    }

    pub fn has(&self, key: &Hash) -> bool {
        self.map.contains_key(key)
    }

    pub fn keys(&self) -> &[Hash] {
        &self.keys
    }

    /// Values in insertion order.
    pub fn slice(&self) -> Vec<&V> {
        self.keys.iter().map(|k| &self.map[k]).collect()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn copy(&self) -> OrderedMap<V>
    where
        V: Clone,
    {
        self.clone()
    }

    /// Right-biased merge: a value from `other` overwrites the same key's
    /// value in `self`, but a key already in `self` keeps its existing
    /// position; only genuinely new keys are appended, in `other`'s order.
    pub fn merge(&mut self, other: &OrderedMap<V>)
    where
        V: Clone,
    {
        for key in &other.keys {
            let value = other.map[key].clone();
            self.set(*key, value);
        }
    }
}

impl OrderedMap<Entry> {
    /// Builds a map from a sequence of entries, deduplicating by hash and
    /// keeping only the first occurrence of each hash.
    pub fn from_entries<It: IntoIterator<Item = Entry>>(entries: It) -> OrderedMap<Entry> {
        let mut map = OrderedMap::new();
        for entry in entries {
            let hash = entry.hash();
            if !map.has(&hash) {
                map.set(hash, entry);
            }
        }
        map
    }
}
