//! Constants for the portal data layer.
//!
//! Cache lifetimes, upload limits, naming rules, and persisted file formats.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Default lifetime of a cached collection, in seconds (5 minutes).
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Longest accepted keyed-scope key.
/// Matches the identifier limit of the SQL backends the keys are spliced into.
pub const MAX_SCOPE_KEY_LEN: usize = 128;

// ═══════════════════════════════════════════════════════════════════════════════
// UPLOAD LIMITS
// ═══════════════════════════════════════════════════════════════════════════════

/// Largest accepted document upload (500 MiB).
pub const DOCUMENT_MAX_UPLOAD_BYTES: usize = 500 * 1024 * 1024;

/// Largest accepted bulletin upload (100 MiB).
pub const BULLETIN_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Longest sanitized file name kept inside a generated resource name.
pub const MAX_FILE_NAME_LEN: usize = 200;

// ═══════════════════════════════════════════════════════════════════════════════
// COMMON POOL
// ═══════════════════════════════════════════════════════════════════════════════

/// Prefix of the per-component-type second-source tables.
pub const COMMON_POOL_TABLE_PREFIX: &str = "SecondSourceList_";

/// Column the common-pool tables are ordered by (descending).
pub const COMMON_POOL_ORDER_COLUMN: &str = "ID";

// ═══════════════════════════════════════════════════════════════════════════════
// PERSISTED FORMATS
// ═══════════════════════════════════════════════════════════════════════════════

/// Magic bytes at the start of a record store file.
pub const RECORD_FILE_MAGIC: &[u8; 4] = b"PRTL";

/// Current record store file format version.
pub const RECORD_FILE_VERSION: u8 = 1;

/// Size of the record file header: magic (4) + version (1) + count (8).
pub const RECORD_FILE_HEADER_SIZE: usize = 4 + 1 + 8;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_limits() {
        assert_eq!(DOCUMENT_MAX_UPLOAD_BYTES, 524_288_000);
        assert_eq!(BULLETIN_MAX_UPLOAD_BYTES, 104_857_600);
        assert!(BULLETIN_MAX_UPLOAD_BYTES < DOCUMENT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_header_size() {
        assert_eq!(RECORD_FILE_HEADER_SIZE, RECORD_FILE_MAGIC.len() + 1 + 8);
    }
}
