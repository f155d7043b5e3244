//! File-backed record store.
//!
//! Keeps records in a [`MemoryRecordStore`] and rewrites the file after every
//! successful write, so an acknowledged insert or delete survives a restart.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};

use portal_core::constants::{RECORD_FILE_HEADER_SIZE, RECORD_FILE_MAGIC, RECORD_FILE_VERSION};
use portal_core::error::{PortalError, Result};
use portal_core::traits::{Record, RecordStore};

use crate::MemoryRecordStore;

/// Record store persisted to a single file.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "PRTL"
/// version (1 byte): 1
/// count (8 bytes, little endian): number of records
/// records (variable): JSON array
/// ```
pub struct FileRecordStore<R> {
    path: PathBuf,
    memory: MemoryRecordStore<R>,
    /// Serializes writes so the file always matches one memory snapshot
    write_lock: Mutex<()>,
}

impl<R: Record> FileRecordStore<R> {
    /// Opens the store at `path`, loading it if the file exists.
    ///
    /// A missing file is an empty store; the file is created on first write.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            memory: MemoryRecordStore::new(),
            write_lock: Mutex::new(()),
        };

        if store.path.exists() {
            store.load().await?;
        }

        Ok(store)
    }

    #[instrument(skip(self), fields(kind = R::KIND, path = ?self.path))]
    async fn load(&self) -> Result<()> {
        let contents = fs::read(&self.path).await?;

        if contents.len() < RECORD_FILE_HEADER_SIZE {
            return Err(PortalError::StorageError("record file too short".into()));
        }
        if &contents[0..4] != RECORD_FILE_MAGIC {
            return Err(PortalError::StorageError("invalid record file magic".into()));
        }
        let version = contents[4];
        if version != RECORD_FILE_VERSION {
            return Err(PortalError::VersionMismatch {
                expected: RECORD_FILE_VERSION,
                actual: version,
            });
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&contents[5..RECORD_FILE_HEADER_SIZE]);
        let count = u64::from_le_bytes(count_bytes);

        let records: Vec<R> = if contents.len() > RECORD_FILE_HEADER_SIZE {
            serde_json::from_slice(&contents[RECORD_FILE_HEADER_SIZE..])?
        } else {
            Vec::new()
        };
        if records.len() as u64 != count {
            return Err(PortalError::StorageError(format!(
                "record count mismatch: header says {}, body has {}",
                count,
                records.len()
            )));
        }

        self.memory.import(records);
        info!(count, "records loaded");
        Ok(())
    }

    /// Writes the current records to disk (temp file, then rename).
    #[instrument(skip(self), fields(kind = R::KIND, path = ?self.path))]
    pub async fn save(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.save_locked().await
    }

    async fn save_locked(&self) -> Result<()> {
        let records = self.memory.all_records();
        let count = records.len() as u64;
        let body = serde_json::to_vec(&records)?;

        let mut contents = Vec::with_capacity(RECORD_FILE_HEADER_SIZE + body.len());
        contents.extend_from_slice(RECORD_FILE_MAGIC);
        contents.push(RECORD_FILE_VERSION);
        contents.extend_from_slice(&count.to_le_bytes());
        contents.extend_from_slice(&body);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!(count, "records saved");
        Ok(())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }
}

#[async_trait]
impl<R: Record> RecordStore<R> for FileRecordStore<R> {
    async fn insert(&self, record: R) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let id = self.memory.insert(record).await?;
        if let Err(e) = self.save_locked().await {
            // Not acknowledged, so not kept
            self.memory.delete(id).await?;
            return Err(e);
        }
        Ok(id)
    }

    async fn get(&self, id: u64) -> Result<Option<R>> {
        self.memory.get(id).await
    }

    async fn delete(&self, id: u64) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let removed = match self.memory.get(id).await? {
            Some(record) => record,
            None => return Ok(0),
        };
        self.memory.delete(id).await?;
        if let Err(e) = self.save_locked().await {
            self.memory.import(vec![removed]);
            return Err(e);
        }
        Ok(1)
    }

    async fn list(&self) -> Result<Vec<R>> {
        self.memory.list().await
    }
}
