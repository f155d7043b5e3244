//! Fakes with switchable failures for service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use portal_core::error::{PortalError, Result};
use portal_core::traits::{AuditSink, CacheInvalidator, Record, RecordStore, ResourceStore};
use portal_core::types::{Actor, AuditAction, AuditRecord, ResourceLocation};
use portal_storage::{BestEffortAuditLogger, MemoryAuditSink, MemoryRecordStore};

pub fn actor() -> Actor {
    Actor::new("amy", "A31_HWD", "PWR")
}

fn flag(f: &AtomicBool) -> bool {
    f.load(Ordering::SeqCst)
}

/// Memory record store that can be told to fail.
pub struct FlakyRecordStore<R> {
    pub inner: MemoryRecordStore<R>,
    fail_inserts: AtomicBool,
    fail_deletes: AtomicBool,
    fail_lists: AtomicBool,
    zero_deletes: AtomicBool,
    pub lists: AtomicUsize,
}

impl<R: Record> FlakyRecordStore<R> {
    pub fn new() -> Self {
        Self {
            inner: MemoryRecordStore::new(),
            fail_inserts: AtomicBool::new(false),
            fail_deletes: AtomicBool::new(false),
            fail_lists: AtomicBool::new(false),
            zero_deletes: AtomicBool::new(false),
            lists: AtomicUsize::new(0),
        }
    }

    pub fn fail_inserts(&self, on: bool) {
        self.fail_inserts.store(on, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, on: bool) {
        self.fail_deletes.store(on, Ordering::SeqCst);
    }

    pub fn fail_lists(&self, on: bool) {
        self.fail_lists.store(on, Ordering::SeqCst);
    }

    pub fn report_zero_deletes(&self, on: bool) {
        self.zero_deletes.store(on, Ordering::SeqCst);
    }

    pub fn list_calls(&self) -> usize {
        self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for FlakyRecordStore<R> {
    async fn insert(&self, record: R) -> Result<u64> {
        if flag(&self.fail_inserts) {
            return Err(PortalError::StorageError("insert rejected".into()));
        }
        self.inner.insert(record).await
    }

    async fn get(&self, id: u64) -> Result<Option<R>> {
        self.inner.get(id).await
    }

    async fn delete(&self, id: u64) -> Result<u64> {
        if flag(&self.fail_deletes) {
            return Err(PortalError::StorageError("delete rejected".into()));
        }
        if flag(&self.zero_deletes) {
            return Ok(0);
        }
        self.inner.delete(id).await
    }

    async fn list(&self) -> Result<Vec<R>> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        if flag(&self.fail_lists) {
            return Err(PortalError::StorageError("database unreachable".into()));
        }
        self.inner.list().await
    }
}

/// In-memory resource store with counters and switchable failures.
#[derive(Default)]
pub struct FakeResourceStore {
    files: Mutex<HashMap<ResourceLocation, Vec<u8>>>,
    next: AtomicUsize,
    puts: AtomicUsize,
    deletes: AtomicUsize,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FakeResourceStore {
    pub fn fail_puts(&self, on: bool) {
        self.fail_puts.store(on, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, on: bool) {
        self.fail_deletes.store(on, Ordering::SeqCst);
    }

    pub fn contains(&self, location: &ResourceLocation) -> bool {
        self.files.lock().unwrap().contains_key(location)
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    /// Removes a file behind the coordinator's back.
    pub fn remove_silently(&self, location: &ResourceLocation) {
        self.files.lock().unwrap().remove(location);
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceStore for FakeResourceStore {
    async fn put(&self, bytes: &[u8], suggested_name: &str) -> Result<ResourceLocation> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if flag(&self.fail_puts) {
            return Err(PortalError::IoError(std::io::Error::other("disk full")));
        }
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        let location = ResourceLocation::new(format!("{n:08}_{suggested_name}"));
        self.files.lock().unwrap().insert(location.clone(), bytes.to_vec());
        Ok(location)
    }

    async fn delete(&self, location: &ResourceLocation) -> Result<bool> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if flag(&self.fail_deletes) {
            return Err(PortalError::IoError(std::io::Error::other("file locked")));
        }
        Ok(self.files.lock().unwrap().remove(location).is_some())
    }

    async fn exists(&self, location: &ResourceLocation) -> Result<bool> {
        Ok(self.contains(location))
    }
}

/// Audit sink that records everything, or fails everything when broken.
#[derive(Default)]
pub struct ToggleAuditSink {
    memory: MemoryAuditSink,
    broken: AtomicBool,
}

#[async_trait]
impl AuditSink for ToggleAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        if flag(&self.broken) {
            return Err(PortalError::AuditError("audit table unavailable".into()));
        }
        self.memory.append(record).await
    }
}

/// Counts invalidations.
#[derive(Default)]
pub struct CountingInvalidator {
    calls: AtomicUsize,
}

impl CountingInvalidator {
    pub fn count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CacheInvalidator for CountingInvalidator {
    fn invalidate(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Every collaborator of a coordinator or service, as inspectable fakes.
pub struct Fixture<R> {
    pub records: Arc<FlakyRecordStore<R>>,
    pub resources: Arc<FakeResourceStore>,
    pub audit: Arc<BestEffortAuditLogger<ToggleAuditSink>>,
    pub invalidator: Arc<CountingInvalidator>,
}

impl<R: Record> Fixture<R> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(FlakyRecordStore::new()),
            resources: Arc::new(FakeResourceStore::default()),
            audit: Arc::new(BestEffortAuditLogger::new(ToggleAuditSink::default())),
            invalidator: Arc::new(CountingInvalidator::default()),
        }
    }

    pub fn with_broken_audit() -> Self {
        let fx = Self::new();
        fx.audit.sink().broken.store(true, Ordering::SeqCst);
        fx
    }

    pub fn audit_records(&self) -> Vec<AuditRecord> {
        self.audit.sink().memory.records()
    }

    pub fn audit_actions(&self) -> Vec<AuditAction> {
        self.audit_records().iter().map(|r| r.action).collect()
    }
}
