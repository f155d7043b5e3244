//! # Portal Services
//!
//! The four data-access services of the portal, built from the read-through
//! caches in `portal-cache` and the stores in `portal-storage`:
//!
//! - [`DocumentService`]: document library (500 MiB uploads)
//! - [`BulletinService`]: department bulletins (100 MiB uploads)
//! - [`SecondSourceService`]: read-only second-source list
//! - [`CommonPoolService`]: per-component-type tables, validated keys
//!
//! Uploads and deletes go through a [`MutationCoordinator`], which keeps the
//! stored file and its metadata record consistent and invalidates the list
//! cache only after a write succeeds.
//!
//! List reads never fail: a load error is logged and shows up as an empty
//! result. Writes always report success or failure to the caller.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

mod bulletins;
mod common_pool;
mod coordinator;
mod documents;
mod records;
mod second_source;

#[cfg(test)]
mod test_support;

pub use bulletins::BulletinService;
pub use common_pool::CommonPoolService;
pub use coordinator::{DeleteOutcome, MutationCoordinator};
pub use documents::DocumentService;
pub use records::RecordService;
pub use second_source::SecondSourceService;
