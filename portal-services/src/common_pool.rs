//! Common-pool tables, one per component type.

use std::sync::Arc;

use tracing::error;

use portal_cache::{CacheConfig, CacheStats, KeyedReadThroughCache, SharedLoader};
use portal_core::error::Result;
use portal_core::types::{DataTable, ScopeKey};

/// Cached common-pool tables keyed by component type.
///
/// Tables expire together: a forced reload of one type, or the end of the
/// shared freshness window, drops every cached type.
pub struct CommonPoolService {
    cache: KeyedReadThroughCache<DataTable>,
}

impl CommonPoolService {
    /// Wraps `loader` in a keyed cache.
    pub fn new(loader: SharedLoader<DataTable>, config: CacheConfig) -> Self {
        Self {
            cache: KeyedReadThroughCache::new(loader, config),
        }
    }

    /// Returns the table for `component_type`.
    ///
    /// A malformed component type is rejected before anything is loaded. A
    /// failed load is logged and reads as an empty table.
    pub async fn table(&self, component_type: &str, force_reload: bool) -> Result<Arc<DataTable>> {
        let key = ScopeKey::parse(component_type)?;
        match self.cache.get_key(&key, force_reload).await {
            Ok(table) => Ok(table),
            Err(e) => {
                error!(%key, error = %e, "could not load common-pool table");
                Ok(Arc::new(DataTable::default()))
            }
        }
    }

    /// Number of component types currently cached.
    pub fn cached_types(&self) -> usize {
        self.cache.len()
    }

    /// Counters of the table cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
