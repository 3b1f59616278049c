//! Pool of slots free for reuse, keyed by item type.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::Serialize;

use crate::model::ItemType;

/// Stable identity of a mounted view, independent of the data index it shows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SlotKey(String);

impl SlotKey {
    /// Wrap a key string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Recyclable slots grouped by item type.
///
/// A slot is in the pool at most once. Slots are handed out in key order,
/// which keeps reuse deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecyclePool {
    by_type: HashMap<ItemType, BTreeSet<SlotKey>>,
    type_of_key: HashMap<SlotKey, ItemType>,
}

impl RecyclePool {
    /// Create an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer `key` for reuse by items of `item_type`.
    pub fn put(&mut self, item_type: ItemType, key: SlotKey) {
        self.remove(&key);
        self.by_type.entry(item_type).or_default().insert(key.clone());
        self.type_of_key.insert(key, item_type);
    }

    /// Take a slot for an item of `item_type`.
    pub fn take(&mut self, item_type: ItemType) -> Option<SlotKey> {
        let keys = self.by_type.get_mut(&item_type)?;
        let key = keys.pop_first()?;
        self.type_of_key.remove(&key);
        Some(key)
    }

    /// Withdraw `key`. Returns whether it was pooled.
    pub fn remove(&mut self, key: &SlotKey) -> bool {
        let Some(item_type) = self.type_of_key.remove(key) else {
            return false;
        };
        if let Some(keys) = self.by_type.get_mut(&item_type) {
            keys.remove(key);
        }
        true
    }

    /// True when `key` is pooled.
    pub fn contains(&self, key: &SlotKey) -> bool {
        self.type_of_key.contains_key(key)
    }

    /// Number of pooled slots.
    pub fn len(&self) -> usize {
        self.type_of_key.len()
    }

    /// True when nothing is pooled.
    pub fn is_empty(&self) -> bool {
        self.type_of_key.is_empty()
    }

    /// Drop every pooled slot.
    pub fn clear(&mut self) {
        self.by_type.clear();
        self.type_of_key.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_returns_only_matching_type() {
        let mut pool = RecyclePool::new();
        pool.put(ItemType::new(1), SlotKey::new("a"));
        assert_eq!(pool.take(ItemType::new(2)), None);
        assert_eq!(pool.take(ItemType::new(1)), Some(SlotKey::new("a")));
        assert!(pool.is_empty());
    }

    #[test]
    fn putting_twice_moves_key_between_types() {
        let mut pool = RecyclePool::new();
        pool.put(ItemType::new(1), SlotKey::new("a"));
        pool.put(ItemType::new(2), SlotKey::new("a"));
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.take(ItemType::new(1)), None);
        assert_eq!(pool.take(ItemType::new(2)), Some(SlotKey::new("a")));
    }

    #[test]
    fn remove_withdraws_key() {
        let mut pool = RecyclePool::new();
        pool.put(ItemType::new(1), SlotKey::new("a"));
        assert!(pool.remove(&SlotKey::new("a")));
        assert!(!pool.remove(&SlotKey::new("a")));
        assert!(!pool.contains(&SlotKey::new("a")));
    }

    #[test]
    fn keys_are_handed_out_in_order() {
        let mut pool = RecyclePool::new();
        pool.put(ItemType::default(), SlotKey::new("b"));
        pool.put(ItemType::default(), SlotKey::new("a"));
        assert_eq!(pool.take(ItemType::default()), Some(SlotKey::new("a")));
    }
}
