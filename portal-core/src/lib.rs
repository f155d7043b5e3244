//! # Portal Core
//!
//! Core types, errors, and contracts shared by every portal data-access crate.
//!
//! - **Types**: Domain records, cache scopes, dynamic tables, and audit records
//! - **Errors**: One error taxonomy for reads, writes, and configuration
//! - **Constants**: Cache lifetimes, upload limits, and naming rules
//! - **Traits**: Loader, store, and audit contracts implemented by adapters
//!
//! ## Example
//!
//! ```rust
//! use portal_core::{CacheScope, ScopeKey};
//!
//! let key = ScopeKey::parse("MLCC_0402").unwrap();
//! assert_eq!(CacheScope::Keyed(key).to_string(), "keyed:MLCC_0402");
//!
//! // Keys outside the allow-list never become scopes
//! assert!(ScopeKey::parse("x'; DROP TABLE t;--").is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{PortalError, Result};
pub use traits::*;
pub use types::*;
