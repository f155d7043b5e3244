//! Read-through caches for the portal services.
//!
//! - [`CacheStore`] / [`KeyedCacheStore`]: TTL containers, no loading logic
//! - [`SingleFlight`]: one reload per key at a time
//! - [`ReadThroughCache`] / [`KeyedReadThroughCache`]: check, guard, re-check,
//!   load, with negative caching of failed loads
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use portal_cache::{CacheConfig, ReadThroughCache};
//! use portal_core::{CacheScope, DataLoader, Result};
//!
//! struct Numbers;
//!
//! #[async_trait]
//! impl DataLoader for Numbers {
//!     type Output = Vec<u32>;
//!     async fn load_all(&self, _scope: &CacheScope) -> Result<Vec<u32>> {
//!         Ok(vec![3, 2, 1])
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let cache: ReadThroughCache<Vec<u32>> =
//!     ReadThroughCache::new(Arc::new(Numbers), CacheConfig::default());
//! let first = cache.get(false).await.unwrap();
//! let second = cache.get(false).await.unwrap();
//! assert!(Arc::ptr_eq(&first, &second));
//! # });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

mod config;
mod read_through;
mod single_flight;
mod stats;
mod store;

pub use config::CacheConfig;
pub use read_through::{KeyedReadThroughCache, ReadThroughCache, SharedLoader};
pub use single_flight::SingleFlight;
pub use stats::CacheStats;
pub use store::{CacheEntry, CacheLookup, CacheStore, KeyedCacheStore};
