//! In-memory record store.
//!
//! Thread-safe storage for tests and single-process deployments; also the
//! working set behind [`FileRecordStore`](crate::FileRecordStore).

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, instrument};

use portal_core::error::Result;
use portal_core::traits::{Record, RecordStore};

/// In-memory metadata store keyed by id.
///
/// Ids start at 1 and are never reused, including after deletes.
#[derive(Debug)]
pub struct MemoryRecordStore<R> {
    records: DashMap<u64, R>,
    next_id: AtomicU64,
}

impl<R: Record> MemoryRecordStore<R> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns every record ordered by id (for export and persistence).
    pub fn all_records(&self) -> Vec<R> {
        let mut records: Vec<R> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by_key(|r| r.id());
        records
    }

    /// Imports previously exported records, keeping their ids.
    ///
    /// Records with id 0 are assigned a fresh id.
    pub fn import(&self, records: Vec<R>) -> usize {
        let mut imported = 0;
        for mut record in records {
            if record.id() == 0 {
                record.set_id(self.next_id.fetch_add(1, Ordering::SeqCst));
            } else {
                self.next_id.fetch_max(record.id() + 1, Ordering::SeqCst);
            }
            self.records.insert(record.id(), record);
            imported += 1;
        }
        imported
    }

    /// Removes every record. Ids keep counting up.
    pub fn clear(&self) {
        self.records.clear();
    }
}

impl<R: Record> Default for MemoryRecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for MemoryRecordStore<R> {
    #[instrument(skip(self, record), fields(kind = R::KIND))]
    async fn insert(&self, mut record: R) -> Result<u64> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        record.set_id(id);
        self.records.insert(id, record);
        debug!(id, "record inserted");
        Ok(id)
    }

    async fn get(&self, id: u64) -> Result<Option<R>> {
        Ok(self.records.get(&id).map(|entry| entry.value().clone()))
    }

    #[instrument(skip(self), fields(kind = R::KIND))]
    async fn delete(&self, id: u64) -> Result<u64> {
        let affected = u64::from(self.records.remove(&id).is_some());
        debug!(id, affected, "record delete");
        Ok(affected)
    }

    async fn list(&self) -> Result<Vec<R>> {
        Ok(self.all_records())
    }
}
