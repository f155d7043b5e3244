//! Second-source component qualification list.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::error;

use portal_cache::{CacheConfig, CacheStats, ReadThroughCache, SharedLoader};
use portal_core::error::Result;
use portal_core::traits::{CacheInvalidator, DataLoader};
use portal_core::types::{CacheScope, SecondSourceItem};

/// Fills in `year` and orders rows by date, newest first, undated last.
struct NormalizingLoader {
    inner: SharedLoader<Vec<SecondSourceItem>>,
}

fn by_date_desc(a: &SecondSourceItem, b: &SecondSourceItem) -> Ordering {
    match (a.date.as_deref(), b.date.as_deref()) {
        (Some(x), Some(y)) => y.cmp(x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl DataLoader for NormalizingLoader {
    type Output = Vec<SecondSourceItem>;

    async fn load_all(&self, scope: &CacheScope) -> Result<Vec<SecondSourceItem>> {
        let mut items: Vec<SecondSourceItem> = self
            .inner
            .load_all(scope)
            .await?
            .into_iter()
            .map(SecondSourceItem::with_year_from_date)
            .collect();
        items.sort_by(by_date_desc);
        Ok(items)
    }
}

/// Read-only, cached view of the second-source list.
pub struct SecondSourceService {
    cache: ReadThroughCache<Vec<SecondSourceItem>>,
}

impl SecondSourceService {
    /// Wraps `loader` in a cache.
    pub fn new(loader: SharedLoader<Vec<SecondSourceItem>>, config: CacheConfig) -> Self {
        let normalizing: SharedLoader<Vec<SecondSourceItem>> =
            Arc::new(NormalizingLoader { inner: loader });
        Self {
            cache: ReadThroughCache::new(normalizing, config),
        }
    }

    /// Every row, newest first. A failed load is logged and reads as empty.
    pub async fn items(&self, force_reload: bool) -> Arc<Vec<SecondSourceItem>> {
        match self.cache.get(force_reload).await {
            Ok(items) => items,
            Err(e) => {
                error!(error = %e, "could not load second-source list");
                Arc::new(Vec::new())
            }
        }
    }

    /// Drops the cached list.
    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    /// Counters of the list cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_core::error::PortalError;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering as AtomicOrdering};

    struct RowsLoader {
        rows: Vec<SecondSourceItem>,
        fail: AtomicBool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl DataLoader for RowsLoader {
        type Output = Vec<SecondSourceItem>;

        async fn load_all(&self, _scope: &CacheScope) -> Result<Vec<SecondSourceItem>> {
            self.calls.fetch_add(1, AtomicOrdering::SeqCst);
            if self.fail.load(AtomicOrdering::SeqCst) {
                return Err(PortalError::StorageError("list unreadable".into()));
            }
            Ok(self.rows.clone())
        }
    }

    fn row(id: u64, date: Option<&str>) -> SecondSourceItem {
        SecondSourceItem {
            id,
            date: date.map(String::from),
            candidate_pn: format!("PN-{id}"),
            ..Default::default()
        }
    }

    fn loader(rows: Vec<SecondSourceItem>) -> Arc<RowsLoader> {
        Arc::new(RowsLoader {
            rows,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_items_sorted_with_years() {
        let source = loader(vec![
            row(1, Some("2022_03_01")),
            row(2, None),
            row(3, Some("2024_01_15")),
            row(4, Some("2023_12_31")),
        ]);
        let svc = SecondSourceService::new(source.clone(), CacheConfig::default());

        let items = svc.items(false).await;
        let ids: Vec<u64> = items.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 4, 1, 2]);
        assert_eq!(items[0].year, Some(2024));
        assert_eq!(items[3].year, None);
    }

    #[tokio::test]
    async fn test_items_cached_until_forced() {
        let source = loader(vec![row(1, Some("2024_01_01"))]);
        let svc = SecondSourceService::new(source.clone(), CacheConfig::default());

        svc.items(false).await;
        svc.items(false).await;
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), 1);

        svc.items(true).await;
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), 2);

        svc.invalidate();
        svc.items(false).await;
        assert_eq!(source.calls.load(AtomicOrdering::SeqCst), 3);
        assert_eq!(svc.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_failure_reads_as_empty() {
        let source = loader(vec![row(1, Some("2024_01_01"))]);
        source.fail.store(true, AtomicOrdering::SeqCst);
        let svc = SecondSourceService::new(source.clone(), CacheConfig::default());

        assert!(svc.items(false).await.is_empty());
        source.fail.store(false, AtomicOrdering::SeqCst);
        assert!(svc.items(false).await.is_empty());
        assert_eq!(svc.items(true).await.len(), 1);
        assert_eq!(svc.cache_stats().failures, 1);
    }
}
