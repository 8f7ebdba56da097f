//! Conformance cache.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use lion_core::id::{ProtocolId, TypeDefId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::check::CheckMode;

/// Key of a cached conformance result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub type_id: TypeDefId,
    pub protocol_id: ProtocolId,
    pub mode: CheckMode,
}

impl CacheKey {
    pub fn new(type_id: TypeDefId, protocol_id: ProtocolId, mode: CheckMode) -> Self {
        Self {
            type_id,
            protocol_id,
            mode,
        }
    }
}

/// Counters describing cache usage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// A concurrent map from (type, protocol, mode) to a conformance result.
///
/// Writes are insert-if-absent: when two threads race on the same key the
/// first answer stays. Both compute the same answer for immutable
/// declarations, so either is correct.
///
/// Every [`clear`](Self::clear) starts a new generation. An answer computed
/// under an older generation may predate the change that caused the clear,
/// so [`insert_at`](Self::insert_at) refuses it.
pub struct ConformanceCache {
    entries: DashMap<CacheKey, bool>,
    generation: RwLock<u64>,
    capacity: usize,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ConformanceCache {
    /// Create a cache holding at most `capacity` entries (`0` for no limit).
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            generation: RwLock::new(0),
            capacity,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &CacheKey) -> Option<bool> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(*entry)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// The current generation. Read it before computing an answer and pass
    /// it to [`insert_at`](Self::insert_at).
    pub fn generation(&self) -> u64 {
        *self.generation.read()
    }

    /// Store `value` unless the key already has an answer; returns the
    /// answer that ends up in the cache.
    pub fn insert_if_absent(&self, key: CacheKey, value: bool) -> bool {
        self.insert_at(self.generation(), key, value)
    }

    /// Store `value`, computed while the cache was at `generation`, unless
    /// the key already has an answer.
    ///
    /// # Returns
    ///
    /// The cached answer for `key`. If the cache has been cleared since
    /// `generation`, nothing is stored and `value` is returned unchanged.
    pub fn insert_at(&self, generation: u64, key: CacheKey, value: bool) -> bool {
        let current = self.generation.read();
        if *current != generation {
            debug!(generation, current = *current, "discarding answer from a cleared generation");
            return value;
        }
        if self.capacity > 0 && self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            debug!(capacity = self.capacity, "conformance cache full, resetting");
            self.entries.clear();
        }
        *self.entries.entry(key).or_insert(value)
    }

    /// Drop every cached result and start a new generation. Counters are
    /// kept.
    pub fn clear(&self) {
        let mut generation = self.generation.write();
        *generation += 1;
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl Default for ConformanceCache {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> CacheKey {
        CacheKey::new(TypeDefId::new(), ProtocolId::new(), CheckMode::Subtype)
    }

    #[test]
    fn test_first_writer_wins() {
        let cache = ConformanceCache::new(0);
        let k = key();

        assert_eq!(cache.insert_if_absent(k, true), true);
        assert_eq!(cache.insert_if_absent(k, false), true);
        assert_eq!(cache.get(&k), Some(true));
    }

    #[test]
    fn test_hit_and_miss_counters() {
        let cache = ConformanceCache::default();
        let k = key();

        assert_eq!(cache.get(&k), None);
        cache.insert_if_absent(k, false);
        assert_eq!(cache.get(&k), Some(false));

        let stats = cache.stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[test]
    fn test_full_cache_is_reset() {
        let cache = ConformanceCache::new(2);
        cache.insert_if_absent(key(), true);
        cache.insert_if_absent(key(), true);
        assert_eq!(cache.len(), 2);

        let third = key();
        cache.insert_if_absent(third, false);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&third), Some(false));
    }

    #[test]
    fn test_answer_from_before_a_clear_is_not_stored() {
        let cache = ConformanceCache::default();
        let k = key();

        let generation = cache.generation();
        cache.clear();

        assert_eq!(cache.insert_at(generation, k, false), false);
        assert_eq!(cache.get(&k), None);

        assert_eq!(cache.insert_at(cache.generation(), k, true), true);
        assert_eq!(cache.get(&k), Some(true));
    }

    #[test]
    fn test_modes_are_separate_keys() {
        let cache = ConformanceCache::default();
        let type_id = TypeDefId::new();
        let protocol_id = ProtocolId::new();

        cache.insert_if_absent(CacheKey::new(type_id, protocol_id, CheckMode::Subtype), true);
        assert_eq!(
            cache.get(&CacheKey::new(type_id, protocol_id, CheckMode::Instance)),
            None
        );
    }
}
