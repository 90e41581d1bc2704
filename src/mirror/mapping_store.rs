//! Leader → follower TWAP mappings for one monitoring session.

use std::collections::HashMap;

use crate::models::MirrorKey;

/// A follower TWAP placed on behalf of a leader TWAP.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorMapping {
    pub key: MirrorKey,
    pub follower_order_id: u64,
    pub coin: String,
    /// Exchange asset id the follower order was placed on
    pub asset: u32,
}

/// Single-owner table of active mirrors. Lives as long as the session.
#[derive(Debug, Default)]
pub struct MappingStore {
    mappings: HashMap<MirrorKey, MirrorMapping>,
}

impl MappingStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a mapping under its own key, returning any mapping it replaced.
    pub fn put(&mut self, mapping: MirrorMapping) -> Option<MirrorMapping> {
        self.mappings.insert(mapping.key.clone(), mapping)
    }

    /// Get the mapping for a leader TWAP.
    pub fn get(&self, key: &MirrorKey) -> Option<&MirrorMapping> {
        self.mappings.get(key)
    }

    /// Remove and return the mapping for a leader TWAP.
    pub fn remove(&mut self, key: &MirrorKey) -> Option<MirrorMapping> {
        self.mappings.remove(key)
    }

    pub fn contains(&self, key: &MirrorKey) -> bool {
        self.mappings.contains_key(key)
    }

    /// Whether `order_id` is one of our own follower TWAPs.
    pub fn is_follower_order(&self, order_id: u64) -> bool {
        self.mappings
            .values()
            .any(|m| m.follower_order_id == order_id)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MirrorMapping> {
        self.mappings.values()
    }
}
