//! # Portal Storage
//!
//! Backing stores and loaders behind the portal services.
//!
//! - **Records**: [`MemoryRecordStore`] for tests, [`FileRecordStore`] for
//!   single-node deployments
//! - **Resources**: [`FileResourceStore`] keeps uploaded files in one directory
//! - **Audit**: [`BestEffortAuditLogger`] over a JSON-lines, in-memory, or
//!   libSQL sink
//! - **Loaders**: record lists, JSON lists, and common-pool tables
//!
//! The libSQL adapters are behind the `turso` feature.
//!
//! ## Example
//!
//! ```rust,ignore
//! use portal_storage::{FileRecordStore, RecordListLoader};
//!
//! let store = Arc::new(FileRecordStore::<DocumentItem>::open("documents.bin").await?);
//! let loader = RecordListLoader::new(store.clone());
//! let newest_first = loader.load_all(&CacheScope::Singleton).await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod audit;
mod file;
mod loader;
mod memory;
mod resource;
#[cfg(feature = "turso")]
mod turso;

pub use audit::{BestEffortAuditLogger, JsonlAuditSink, MemoryAuditSink};
pub use file::FileRecordStore;
pub use loader::{JsonListLoader, RecordListLoader, TableDirectoryLoader};
pub use memory::MemoryRecordStore;
pub use resource::FileResourceStore;
#[cfg(feature = "turso")]
pub use turso::{connect_remote, SqlAuditSink, SqlTableLoader};
