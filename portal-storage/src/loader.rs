//! Data loaders feeding the read-through caches.

use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::fs;
use tracing::{debug, instrument};

use portal_core::constants::{COMMON_POOL_ORDER_COLUMN, COMMON_POOL_TABLE_PREFIX};
use portal_core::error::{PortalError, Result};
use portal_core::traits::{DataLoader, Record, RecordStore};
use portal_core::types::{CacheScope, DataTable, ScopeKey};

/// Loads every record from a [`RecordStore`], newest upload first.
pub struct RecordListLoader<R> {
    store: Arc<dyn RecordStore<R>>,
}

impl<R: Record> RecordListLoader<R> {
    /// Creates a loader over `store`.
    pub fn new(store: Arc<dyn RecordStore<R>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<R: Record> DataLoader for RecordListLoader<R> {
    type Output = Vec<R>;

    #[instrument(skip(self), fields(kind = R::KIND))]
    async fn load_all(&self, _scope: &CacheScope) -> Result<Vec<R>> {
        let mut records = self.store.list().await?;
        records.sort_by(|a, b| {
            b.uploaded_at()
                .cmp(&a.uploaded_at())
                .then_with(|| b.id().cmp(&a.id()))
        });
        debug!(count = records.len(), "records loaded");
        Ok(records)
    }
}

/// Reads a JSON array of `T` from a file.
pub struct JsonListLoader<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonListLoader<T> {
    /// Creates a loader for the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }
}

#[async_trait]
impl<T> DataLoader for JsonListLoader<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    type Output = Vec<T>;

    #[instrument(skip(self), fields(path = ?self.path))]
    async fn load_all(&self, _scope: &CacheScope) -> Result<Vec<T>> {
        let bytes = fs::read(&self.path).await?;
        let items: Vec<T> = serde_json::from_slice(&bytes)?;
        debug!(count = items.len(), "list loaded");
        Ok(items)
    }
}

/// Loads common-pool tables from `SecondSourceList_<key>.json` files.
///
/// Each file holds a JSON array of objects; rows are returned ordered by
/// `ID`, largest first.
pub struct TableDirectoryLoader {
    root: PathBuf,
}

impl TableDirectoryLoader {
    /// Creates a loader reading from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// File holding the table for `key`.
    pub fn table_path(&self, key: &ScopeKey) -> PathBuf {
        self.root
            .join(format!("{}{}.json", COMMON_POOL_TABLE_PREFIX, key.as_str()))
    }
}

#[async_trait]
impl DataLoader for TableDirectoryLoader {
    type Output = DataTable;

    #[instrument(skip(self), fields(root = ?self.root))]
    async fn load_all(&self, scope: &CacheScope) -> Result<DataTable> {
        let key = scope.key().ok_or_else(|| {
            PortalError::InternalError("common-pool tables are loaded per key".into())
        })?;

        let bytes = fs::read(self.table_path(key)).await?;
        let objects: Vec<serde_json::Map<String, serde_json::Value>> =
            serde_json::from_slice(&bytes)?;

        let mut table = DataTable::from_json_rows(objects);
        table.sort_desc_by(COMMON_POOL_ORDER_COLUMN);
        debug!(%key, rows = table.len(), "table loaded");
        Ok(table)
    }
}
