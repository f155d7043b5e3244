//! Read-through caches.
//!
//! Both caches follow the same double-checked path:
//!
//! 1. check the store, return on a fresh hit without locking
//! 2. acquire the key's single-flight guard
//! 3. re-check the store, return if another caller already reloaded
//! 4. call the loader and store its result
//!
//! A failed load stores `V::default()` so the next callers within the TTL do
//! not hammer a failing backend; only the caller that ran the loader sees the
//! error.
//!
//! A load that overlaps an invalidation still returns its result to the
//! caller that ran it, but does not store it: the next read reloads.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use portal_core::{CacheInvalidator, CacheScope, DataLoader, PortalError, Result, ScopeKey};

use crate::config::CacheConfig;
use crate::single_flight::SingleFlight;
use crate::stats::{CacheStats, Counters};
use crate::store::{CacheStore, KeyedCacheStore};

/// Shared handle to a loader producing `V`.
pub type SharedLoader<V> = Arc<dyn DataLoader<Output = V>>;

/// Timeout length for error reports, saturating at `u64::MAX`.
fn timeout_millis(limit: Duration) -> u64 {
    u64::try_from(limit.as_millis()).unwrap_or(u64::MAX)
}

/// Runs one loader call, bounded by the configured timeout.
async fn run_loader<V>(
    loader: &SharedLoader<V>,
    scope: &CacheScope,
    config: &CacheConfig,
) -> Result<V>
where
    V: Default + Send + Sync + 'static,
{
    let result = match config.load_timeout {
        Some(limit) => match tokio::time::timeout(limit, loader.load_all(scope)).await {
            Ok(result) => result,
            Err(_) => Err(PortalError::LoadTimeout {
                scope: scope.to_string(),
                millis: timeout_millis(limit),
            }),
        },
        None => loader.load_all(scope).await,
    };
    result.map_err(|e| PortalError::transient_load(scope, e))
}

// ═══════════════════════════════════════════════════════════════════════════════
// SINGLETON
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-through cache over one collection.
pub struct ReadThroughCache<V> {
    loader: SharedLoader<V>,
    config: CacheConfig,
    store: CacheStore<V>,
    reload: Mutex<()>,
    counters: Counters,
}

impl<V> ReadThroughCache<V>
where
    V: Default + Send + Sync + 'static,
{
    /// Creates a cold cache.
    pub fn new(loader: SharedLoader<V>, config: CacheConfig) -> Self {
        Self {
            loader,
            config,
            store: CacheStore::new(),
            reload: Mutex::new(()),
            counters: Counters::default(),
        }
    }

    /// Returns the cached collection, reloading it if missing or stale.
    ///
    /// With `force_reload` both store checks are skipped and the loader always
    /// runs (still one at a time).
    pub async fn get(&self, force_reload: bool) -> Result<Arc<V>> {
        if !force_reload {
            if let Some(value) = self.store.get(self.config.ttl).into_hit() {
                self.counters.hit();
                return Ok(value);
            }
            self.counters.miss();
        }

        let _guard = self.reload.lock().await;

        if !force_reload {
            if let Some(value) = self.store.get(self.config.ttl).into_hit() {
                debug!("reloaded by a concurrent caller");
                self.counters.hit();
                return Ok(value);
            }
        }

        self.load().await
    }

    async fn load(&self) -> Result<Arc<V>> {
        let scope = CacheScope::Singleton;
        let generation = self.store.generation();
        self.counters.load();

        match run_loader(&self.loader, &scope, &self.config).await {
            Ok(value) => {
                let value = Arc::new(value);
                if self.store.put_if_current(generation, Arc::clone(&value)) {
                    info!(%scope, "cache reloaded");
                } else {
                    debug!(%scope, "invalidated during load, result not cached");
                }
                Ok(value)
            }
            Err(e) => {
                self.counters.failure();
                if self.store.put_if_current(generation, Arc::new(V::default())) {
                    warn!(%scope, error = %e, "load failed, caching empty result");
                } else {
                    warn!(%scope, error = %e, "load failed");
                }
                Err(e)
            }
        }
    }

    /// Drops the cached collection.
    pub fn invalidate(&self) {
        self.store.invalidate();
        debug!("cache invalidated");
    }

    /// Returns the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }

    /// Returns the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

impl<V> CacheInvalidator for ReadThroughCache<V>
where
    V: Default + Send + Sync + 'static,
{
    fn invalidate(&self) {
        ReadThroughCache::invalidate(self);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEYED
// ═══════════════════════════════════════════════════════════════════════════════

/// Read-through cache with one entry per validated key.
///
/// Freshness is tracked for the scope as a whole: once the window opened by
/// the first insert expires, or on any forced reload, every key is cleared.
pub struct KeyedReadThroughCache<V> {
    loader: SharedLoader<V>,
    config: CacheConfig,
    store: KeyedCacheStore<ScopeKey, V>,
    flight: SingleFlight<ScopeKey>,
    counters: Counters,
}

impl<V> KeyedReadThroughCache<V>
where
    V: Default + Send + Sync + 'static,
{
    /// Creates a cold cache.
    pub fn new(loader: SharedLoader<V>, config: CacheConfig) -> Self {
        Self {
            loader,
            config,
            store: KeyedCacheStore::new(),
            flight: SingleFlight::new(),
            counters: Counters::default(),
        }
    }

    /// Validates `raw_key` and returns its cached value.
    ///
    /// An invalid key fails with a validation error before the store, the
    /// guard, or the loader is touched.
    pub async fn get(&self, raw_key: &str, force_reload: bool) -> Result<Arc<V>> {
        let key = ScopeKey::parse(raw_key)?;
        self.get_key(&key, force_reload).await
    }

    /// Returns the cached value for an already-validated key.
    pub async fn get_key(&self, key: &ScopeKey, force_reload: bool) -> Result<Arc<V>> {
        if force_reload || self.store.window_expired(self.config.ttl) {
            debug!(%key, force_reload, "clearing keyed scope");
            self.store.invalidate_all();
        }

        if let Some(value) = self.store.get(key, self.config.ttl).into_hit() {
            self.counters.hit();
            return Ok(value);
        }
        self.counters.miss();

        let _guard = self.flight.acquire(key).await;

        if let Some(value) = self.store.get(key, self.config.ttl).into_hit() {
            debug!(%key, "reloaded by a concurrent caller");
            self.counters.hit();
            return Ok(value);
        }

        self.load(key).await
    }

    async fn load(&self, key: &ScopeKey) -> Result<Arc<V>> {
        let scope = CacheScope::Keyed(key.clone());
        let generation = self.store.generation();
        self.counters.load();

        match run_loader(&self.loader, &scope, &self.config).await {
            Ok(value) => {
                let value = Arc::new(value);
                if self.store.put_if_current(generation, key.clone(), Arc::clone(&value)) {
                    info!(%scope, "cache reloaded");
                } else {
                    debug!(%scope, "scope cleared during load, result not cached");
                }
                Ok(value)
            }
            Err(e) => {
                self.counters.failure();
                if self.store.put_if_current(generation, key.clone(), Arc::new(V::default())) {
                    warn!(%scope, error = %e, "load failed, caching empty result");
                } else {
                    warn!(%scope, error = %e, "load failed");
                }
                Err(e)
            }
        }
    }

    /// Clears every key.
    pub fn invalidate_all(&self) {
        self.store.invalidate_all();
        debug!("keyed cache invalidated");
    }

    /// Number of cached keys.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns true if no key is cached.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Returns the cache counters.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}

impl<V> CacheInvalidator for KeyedReadThroughCache<V>
where
    V: Default + Send + Sync + 'static,
{
    fn invalidate(&self) {
        self.invalidate_all();
    }
}
