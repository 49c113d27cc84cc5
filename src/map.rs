use core::fmt;

use crate::{Emberwood, Order};

/// An associative array, storing key-value pairs.
///
/// Uses an Emberwood red-black tree with the value kept as the node payload.
#[derive(Debug)]
pub struct EmberwoodMap<K, V> {
    tree: Emberwood<K, V>,
}

impl<K: Ord + fmt::Debug, V> EmberwoodMap<K, V> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            tree: Emberwood::new(),
        }
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.tree.contains(key)
    }

    /// Returns `false`, leaving the stored value untouched, when `key` is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        self.tree.insert(key, Some(value)).is_ok()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.tree.find(key).ok()?.payload
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.tree.payload_mut(key).ok()?.as_mut()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        self.tree.remove(key).ok()?.1
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.tree
            .traversal(Order::InOrder)
            .filter_map(|visit| Some((visit.key, visit.payload?)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.len()
    }
}

impl<K: Ord + fmt::Debug, V> Default for EmberwoodMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
