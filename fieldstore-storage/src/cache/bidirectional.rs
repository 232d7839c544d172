//! One-to-one map with lookup in both directions.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

/// A map that keeps a forward and a reverse index consistent.
///
/// Re-inserting either side evicts the stale partner entry, so the map stays
/// a bijection and the last writer wins for both keys and values.
#[derive(Debug, Clone)]
pub struct BidirectionalMap<K, V> {
    forward: HashMap<K, V>,
    reverse: HashMap<V, K>,
}

impl<K, V> Default for BidirectionalMap<K, V> {
    fn default() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
        }
    }
}

impl<K, V> BidirectionalMap<K, V>
where
    K: Eq + Hash + Clone,
    V: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            forward: HashMap::with_capacity(capacity),
            reverse: HashMap::with_capacity(capacity),
        }
    }

    /// Insert a pair. Returns true if an existing pairing was displaced.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let mut displaced = false;

        if let Some(old_value) = self.forward.insert(key.clone(), value.clone()) {
            if old_value != value {
                self.reverse.remove(&old_value);
                displaced = true;
            }
        }

        if let Some(old_key) = self.reverse.insert(value, key.clone()) {
            if old_key != key {
                self.forward.remove(&old_key);
                displaced = true;
            }
        }

        displaced
    }

    pub fn get_by_key<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.forward.get(key)
    }

    pub fn get_by_value<Q>(&self, value: &Q) -> Option<&K>
    where
        V: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.reverse.get(value)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.forward.keys()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}
