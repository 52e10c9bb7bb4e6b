use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use super::MatchOutcome;

/// Entries kept by [`BoundedMatchCache::default`].
pub const DEFAULT_CACHE_CAPACITY: usize = 2000;

/// Storage for `find_all_maps` results keyed by the BNGL text of the
/// pattern and the target.
///
/// Implementations are shared between threads through an `Arc`, so every
/// method takes `&self`.
pub trait MatchCache: Send + Sync {
    fn get(&self, pattern: &str, target: &str) -> Option<MatchOutcome>;
    fn insert(&self, pattern: &str, target: &str, outcome: &MatchOutcome);
    fn clear(&self);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
struct Entries {
    by_pattern: HashMap<String, HashMap<String, MatchOutcome>>,
    len: usize,
}

/// A capped cache. Nothing is evicted: once `capacity` entries are stored,
/// further inserts are dropped until [`clear`](MatchCache::clear).
pub struct BoundedMatchCache {
    entries: RwLock<Entries>,
    capacity: usize,
}

impl BoundedMatchCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(Entries::default()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BoundedMatchCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl MatchCache for BoundedMatchCache {
    fn get(&self, pattern: &str, target: &str) -> Option<MatchOutcome> {
        let entries = self.entries.read();
        let hit = entries.by_pattern.get(pattern)?.get(target).cloned();
        if hit.is_some() {
            debug!("match cache hit for {pattern} in {target}");
        }
        hit
    }

    fn insert(&self, pattern: &str, target: &str, outcome: &MatchOutcome) {
        let mut entries = self.entries.write();
        if entries.len >= self.capacity {
            debug!(
                "match cache full ({} entries), not storing {pattern} in {target}",
                self.capacity
            );
            return;
        }
        let previous = entries
            .by_pattern
            .entry(pattern.to_string())
            .or_default()
            .insert(target.to_string(), outcome.clone());
        if previous.is_none() {
            entries.len += 1;
        }
    }

    fn clear(&self) {
        let mut entries = self.entries.write();
        entries.by_pattern.clear();
        entries.len = 0;
    }

    fn len(&self) -> usize {
        self.entries.read().len
    }
}

/// Stores nothing. Every lookup misses.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMatchCache;

impl MatchCache for NoMatchCache {
    fn get(&self, _pattern: &str, _target: &str) -> Option<MatchOutcome> {
        None
    }

    fn insert(&self, _pattern: &str, _target: &str, _outcome: &MatchOutcome) {}

    fn clear(&self) {}

    fn len(&self) -> usize {
        0
    }
}
