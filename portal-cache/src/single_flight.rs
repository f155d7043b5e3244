//! Per-key single-flight guard.
//!
//! At most one holder per key at a time; the second caller for the same key
//! waits until the first drops its guard, then re-checks the store.

use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Hands out one async lock per key.
///
/// Entries are never pruned; callers use a bounded key set.
pub struct SingleFlight<K> {
    inflight: DashMap<K, Arc<Mutex<()>>>,
}

impl<K: Eq + Hash + Clone> SingleFlight<K> {
    /// Creates an empty guard set.
    pub fn new() -> Self {
        Self {
            inflight: DashMap::new(),
        }
    }

    /// Waits for exclusive ownership of `key`. Dropping the guard releases it.
    pub async fn acquire(&self, key: &K) -> OwnedMutexGuard<()> {
        // The DashMap shard lock is released before awaiting.
        let lock = Arc::clone(
            self.inflight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        );
        lock.lock_owned().await
    }

    /// Number of keys that have ever been guarded.
    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    /// Returns true if no key has been guarded yet.
    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }
}

impl<K: Eq + Hash + Clone> Default for SingleFlight<K> {
    fn default() -> Self {
        Self::new()
    }
}
