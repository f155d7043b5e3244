//! Contracts between the portal services and their collaborators.
//!
//! Services depend only on these traits, so every backing store (files,
//! libSQL, in-memory fakes) is interchangeable.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::types::{AuditRecord, AuditSubject, CacheScope, ResourceLocation};

// ═══════════════════════════════════════════════════════════════════════════════
// DATA LOADER
// ═══════════════════════════════════════════════════════════════════════════════

/// Fetches the authoritative dataset for a cache scope.
///
/// Implementations must be safely callable concurrently for different scopes.
/// Any error is surfaced to the cache as a load failure.
#[async_trait]
pub trait DataLoader: Send + Sync {
    /// The loaded dataset. `Default` is the empty (negative) result.
    type Output: Default + Send + Sync + 'static;

    /// Loads everything in `scope`.
    async fn load_all(&self, scope: &CacheScope) -> Result<Self::Output>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// RESOURCE STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// Stores physical resources (uploaded files).
///
/// Implementations generate collision-free locations; the suggested name is
/// only a readable hint embedded in the location.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Persists `bytes` and returns where they were stored.
    async fn put(&self, bytes: &[u8], suggested_name: &str) -> Result<ResourceLocation>;

    /// Removes a resource. Returns true if it existed and was removed.
    async fn delete(&self, location: &ResourceLocation) -> Result<bool>;

    /// Checks whether a resource exists.
    async fn exists(&self, location: &ResourceLocation) -> Result<bool>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// METADATA RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// A metadata record that may reference a physical resource.
pub trait Record: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Short kind name used in logs and audit subjects.
    const KIND: &'static str;

    /// Store-assigned identifier (0 before insertion).
    fn id(&self) -> u64;

    /// Sets the identifier. Called by record stores on insertion.
    fn set_id(&mut self, id: u64);

    /// The physical resource this record describes.
    fn location(&self) -> Option<&ResourceLocation>;

    /// Upload time, used for newest-first ordering.
    fn uploaded_at(&self) -> DateTime<Utc>;

    /// Description written to the audit trail.
    fn audit_subject(&self) -> AuditSubject;

    /// Department to record as the actor's, when the record carries its own.
    fn audit_department(&self) -> Option<&str> {
        None
    }
}

/// Caller-supplied descriptive fields that become a [`Record`] once the
/// physical resource has been stored.
pub trait RecordDraft: Send {
    /// The record this draft completes into.
    type Record: Record;

    /// Checks the fields before any I/O happens.
    fn validate(&self) -> Result<()>;

    /// Completes the record with the resource location.
    fn into_record(
        self,
        original_name: &str,
        location: ResourceLocation,
        uploaded_at: DateTime<Utc>,
    ) -> Self::Record;
}

/// Interface for metadata record storage.
///
/// Implementations might use:
/// - In-memory storage (for testing)
/// - A local file (single-node deployments)
/// - libSQL / Turso
#[async_trait]
pub trait RecordStore<R: Record>: Send + Sync {
    /// Inserts a record and returns its assigned id.
    async fn insert(&self, record: R) -> Result<u64>;

    /// Retrieves a record by id.
    async fn get(&self, id: u64) -> Result<Option<R>>;

    /// Deletes a record. Returns the number of affected records.
    async fn delete(&self, id: u64) -> Result<u64>;

    /// Returns every record.
    async fn list(&self) -> Result<Vec<R>>;
}

// ═══════════════════════════════════════════════════════════════════════════════
// AUDIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Fallible destination of audit records (a table, a file, ...).
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one record.
    async fn append(&self, record: &AuditRecord) -> Result<()>;
}

/// Best-effort audit trail as seen by the mutation path.
///
/// Infallible by contract: implementations catch and discard their own
/// failures.
#[async_trait]
pub trait AuditLogger: Send + Sync {
    /// Records an action.
    async fn log(&self, record: AuditRecord);
}

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE INVALIDATION
// ═══════════════════════════════════════════════════════════════════════════════

/// Something holding cached reads that a successful mutation makes stale.
pub trait CacheInvalidator: Send + Sync {
    /// Drops the cached state so the next read reloads.
    fn invalidate(&self);
}
