//! Audit sinks and the best-effort logger wrapping them.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, instrument};

use portal_core::error::{PortalError, Result};
use portal_core::traits::{AuditLogger, AuditSink};
use portal_core::types::AuditRecord;

/// Turns any [`AuditSink`] into an infallible [`AuditLogger`].
///
/// Sink failures are logged at error level and dropped here.
pub struct BestEffortAuditLogger<S> {
    sink: S,
}

impl<S: AuditSink> BestEffortAuditLogger<S> {
    /// Wraps `sink`.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Returns the wrapped sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

#[async_trait]
impl<S: AuditSink> AuditLogger for BestEffortAuditLogger<S> {
    async fn log(&self, record: AuditRecord) {
        match self.sink.append(&record).await {
            Ok(()) => debug!(action = %record.action, name = %record.subject.name, "audit recorded"),
            Err(e) => error!(
                action = %record.action,
                name = %record.subject.name,
                error = %e,
                "audit write failed"
            ),
        }
    }
}

/// Keeps audit records in memory. For tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far.
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records.lock().clone()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    /// Returns true if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl AuditSink for MemoryAuditSink {
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }
}

/// Appends audit records to a file, one JSON object per line.
#[derive(Debug)]
pub struct JsonlAuditSink {
    path: PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonlAuditSink {
    /// Creates a sink writing to `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Returns the log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditSink for JsonlAuditSink {
    #[instrument(skip(self, record), fields(path = ?self.path))]
    async fn append(&self, record: &AuditRecord) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let _guard = self.write_lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| PortalError::AuditError(format!("open {}: {}", self.path.display(), e)))?;
        file.write_all(&line)
            .await
            .map_err(|e| PortalError::AuditError(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| PortalError::AuditError(e.to_string()))?;
        Ok(())
    }
}
