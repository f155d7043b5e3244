//! In-memory TTL stores for loaded collections.
//!
//! Stores only hold values; they never call a loader. Values are shared as
//! `Arc<V>` and every reload swaps in a whole new entry, so readers see either
//! the old complete value or the new one.
//!
//! Each store carries a generation that every invalidation advances. A loader
//! result is written back with [`CacheStore::put_if_current`] only if no
//! invalidation happened since the load started.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;

/// A loaded value and the moment it was loaded.
#[derive(Debug)]
pub struct CacheEntry<V> {
    value: Arc<V>,
    loaded_at: Instant,
}

impl<V> Clone for CacheEntry<V> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            loaded_at: self.loaded_at,
        }
    }
}

impl<V> CacheEntry<V> {
    fn new(value: Arc<V>) -> Self {
        Self {
            value,
            loaded_at: Instant::now(),
        }
    }

    /// Time since the value was loaded.
    pub fn age(&self) -> Duration {
        self.loaded_at.elapsed()
    }

    fn lookup(&self, ttl: Duration) -> CacheLookup<V> {
        let age = self.age();
        if age < ttl {
            CacheLookup::Hit(Arc::clone(&self.value))
        } else {
            CacheLookup::Stale(age)
        }
    }
}

/// Outcome of a store lookup.
#[derive(Debug)]
pub enum CacheLookup<V> {
    /// Fresh value
    Hit(Arc<V>),
    /// An entry exists but is older than the TTL; it must be reloaded before use
    Stale(Duration),
    /// Nothing cached
    Miss,
}

impl<V> CacheLookup<V> {
    /// Returns true for a fresh hit.
    pub fn is_hit(&self) -> bool {
        matches!(self, CacheLookup::Hit(_))
    }

    /// Returns the fresh value, if any.
    pub fn into_hit(self) -> Option<Arc<V>> {
        match self {
            CacheLookup::Hit(value) => Some(value),
            _ => None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SINGLETON STORE
// ═══════════════════════════════════════════════════════════════════════════════

struct SingletonState<V> {
    entry: Option<CacheEntry<V>>,
    generation: u64,
}

/// Holds one cached collection.
pub struct CacheStore<V> {
    state: RwLock<SingletonState<V>>,
}

impl<V> CacheStore<V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SingletonState {
                entry: None,
                generation: 0,
            }),
        }
    }

    /// Looks up the cached value against `ttl`. A stale entry is reported but
    /// left in place.
    pub fn get(&self, ttl: Duration) -> CacheLookup<V> {
        match self.state.read().entry.as_ref() {
            Some(entry) => entry.lookup(ttl),
            None => CacheLookup::Miss,
        }
    }

    /// Replaces the cached value, stamping it with the current time.
    pub fn put(&self, value: Arc<V>) {
        self.state.write().entry = Some(CacheEntry::new(value));
    }

    /// Current invalidation generation.
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Stores `value` only if the store has not been invalidated since
    /// `generation` was read. Returns whether the value was stored.
    pub fn put_if_current(&self, generation: u64, value: Arc<V>) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            return false;
        }
        state.entry = Some(CacheEntry::new(value));
        true
    }

    /// Removes the cached value unconditionally.
    pub fn invalidate(&self) {
        let mut state = self.state.write();
        state.entry = None;
        state.generation += 1;
    }

    /// Returns true if nothing is cached (fresh or stale).
    pub fn is_empty(&self) -> bool {
        self.state.read().entry.is_none()
    }
}

impl<V> Default for CacheStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEYED STORE
// ═══════════════════════════════════════════════════════════════════════════════

struct KeyedState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    /// Start of the scope-wide freshness window; set by the first insert into
    /// an empty scope, cleared with the scope.
    window_started: Option<Instant>,
    generation: u64,
}

/// Holds one cached value per key, plus a scope-wide freshness window.
pub struct KeyedCacheStore<K, V> {
    state: RwLock<KeyedState<K, V>>,
}

impl<K: Eq + Hash, V> KeyedCacheStore<K, V> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(KeyedState {
                entries: HashMap::new(),
                window_started: None,
                generation: 0,
            }),
        }
    }

    /// Looks up `key` against `ttl`.
    pub fn get(&self, key: &K, ttl: Duration) -> CacheLookup<V> {
        match self.state.read().entries.get(key) {
            Some(entry) => entry.lookup(ttl),
            None => CacheLookup::Miss,
        }
    }

    /// Replaces the value for `key`. Opens the freshness window if the scope
    /// was empty.
    pub fn put(&self, key: K, value: Arc<V>) {
        let mut state = self.state.write();
        Self::insert(&mut state, key, value);
    }

    fn insert(state: &mut KeyedState<K, V>, key: K, value: Arc<V>) {
        if state.entries.is_empty() {
            state.window_started = Some(Instant::now());
        }
        state.entries.insert(key, CacheEntry::new(value));
    }

    /// Current invalidation generation of the scope.
    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    /// Stores `value` under `key` only if no key was invalidated since
    /// `generation` was read. Returns whether the value was stored.
    pub fn put_if_current(&self, generation: u64, key: K, value: Arc<V>) -> bool {
        let mut state = self.state.write();
        if state.generation != generation {
            return false;
        }
        Self::insert(&mut state, key, value);
        true
    }

    /// Removes one key.
    pub fn invalidate(&self, key: &K) {
        let mut state = self.state.write();
        state.entries.remove(key);
        state.generation += 1;
        if state.entries.is_empty() {
            state.window_started = None;
        }
    }

    /// Clears every key in the scope and closes the freshness window.
    pub fn invalidate_all(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.window_started = None;
        state.generation += 1;
    }

    /// Returns true once the scope-wide window is at least `ttl` old.
    pub fn window_expired(&self, ttl: Duration) -> bool {
        self.state
            .read()
            .window_started
            .map(|started| started.elapsed() >= ttl)
            .unwrap_or(false)
    }

    /// Returns true if `key` has an entry (fresh or stale).
    pub fn contains(&self, key: &K) -> bool {
        self.state.read().entries.contains_key(key)
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    /// Returns true if no key is cached.
    pub fn is_empty(&self) -> bool {
        self.state.read().entries.is_empty()
    }
}

impl<K: Eq + Hash, V> Default for KeyedCacheStore<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
