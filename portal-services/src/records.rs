//! Cached catalog of uploaded records (documents, bulletins).

use std::sync::Arc;

use tracing::error;

use portal_cache::{CacheConfig, CacheStats, ReadThroughCache, SharedLoader};
use portal_core::error::Result;
use portal_core::traits::{AuditLogger, Record, RecordDraft, RecordStore, ResourceStore};
use portal_core::types::{Actor, PendingWrite, UploadFile};
use portal_storage::RecordListLoader;

use crate::coordinator::{DeleteOutcome, MutationCoordinator};

/// Read-through list of records plus the upload/delete path that keeps it
/// fresh.
pub struct RecordService<R: Record> {
    records: Arc<dyn RecordStore<R>>,
    cache: Arc<ReadThroughCache<Vec<R>>>,
    coordinator: MutationCoordinator<R>,
}

impl<R: Record> RecordService<R> {
    /// Wires a service over the given stores.
    pub fn new(
        records: Arc<dyn RecordStore<R>>,
        resources: Arc<dyn ResourceStore>,
        audit: Arc<dyn AuditLogger>,
        actor: Actor,
        config: CacheConfig,
        max_upload_bytes: usize,
    ) -> Self {
        let loader: SharedLoader<Vec<R>> = Arc::new(RecordListLoader::new(Arc::clone(&records)));
        let cache = Arc::new(ReadThroughCache::new(loader, config));
        let coordinator = MutationCoordinator::new(
            Arc::clone(&records),
            resources,
            audit,
            cache.clone(),
            actor,
            max_upload_bytes,
        );
        Self {
            records,
            cache,
            coordinator,
        }
    }

    /// All records, newest upload first.
    ///
    /// A failed load is logged and returned as an empty list.
    pub async fn list(&self, force_reload: bool) -> Arc<Vec<R>> {
        match self.cache.get(force_reload).await {
            Ok(records) => records,
            Err(e) => {
                error!(kind = R::KIND, error = %e, "could not load records");
                Arc::new(Vec::new())
            }
        }
    }

    /// Looks up one record, bypassing the cache. Failures read as `None`.
    pub async fn find(&self, id: u64) -> Option<R> {
        match self.records.get(id).await {
            Ok(record) => record,
            Err(e) => {
                error!(kind = R::KIND, id, error = %e, "record lookup failed");
                None
            }
        }
    }

    /// Stores `file` and a record built from `draft`.
    pub async fn upload<D>(&self, file: UploadFile, draft: D) -> Result<R>
    where
        D: RecordDraft<Record = R>,
    {
        self.coordinator.upload(PendingWrite::new(file, draft)).await
    }

    /// Deletes a record and its file.
    pub async fn delete(&self, id: u64) -> Result<DeleteOutcome> {
        self.coordinator.delete(id).await
    }

    /// Records that `record` was opened.
    pub async fn log_open(&self, record: &R) {
        self.coordinator.log_open(record).await;
    }

    /// Largest accepted upload, in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.coordinator.max_payload()
    }

    /// Counters of the list cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
