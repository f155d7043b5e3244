//! Domain types for the portal.
//!
//! - [`ScopeKey`] / [`CacheScope`]: Validated cache keys and scopes
//! - [`ResourceLocation`] / [`PendingWrite`]: Physical resources and uploads
//! - [`DocumentItem`], [`BulletinItem`], [`SecondSourceItem`]: Metadata records
//! - [`DataTable`]: Dynamically-shaped rows with tagged cell values
//! - [`AuditRecord`]: Entries of the append-only audit trail

mod audit;
mod records;
mod resource;
mod scope;
mod table;

pub use audit::*;
pub use records::*;
pub use resource::*;
pub use scope::*;
pub use table::*;
