//! Error types for the portal data layer.
//!
//! One `thiserror` hierarchy covers the read path, the write path, the audit
//! side channel, and configuration. Classification helpers let callers decide
//! whether a failure is worth retrying or should be shown to the user as-is.

use thiserror::Error;

/// Result type alias using `PortalError`.
pub type Result<T> = std::result::Result<T, PortalError>;

/// Main error type for all portal operations.
#[derive(Debug, Error)]
pub enum PortalError {
    // ═══════════════════════════════════════════════════════════════════════════
    // VALIDATION ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Malformed cache key or input field. Raised before any I/O.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Upload payload exceeds the configured maximum.
    #[error("Payload too large: {actual} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { limit: usize, actual: usize },

    // ═══════════════════════════════════════════════════════════════════════════
    // READ PATH ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Backing store unreachable or query failed during a reload.
    #[error("Load failed for scope '{scope}': {reason}")]
    TransientLoad { scope: String, reason: String },

    /// Loader did not finish within the configured timeout.
    #[error("Load timed out for scope '{scope}' after {millis}ms")]
    LoadTimeout { scope: String, millis: u64 },

    // ═══════════════════════════════════════════════════════════════════════════
    // WRITE PATH ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Writing a resource or persisting its metadata failed.
    #[error("{operation} failed: {reason}")]
    MutationError { operation: String, reason: String },

    /// Failure writing the best-effort audit trail.
    #[error("Audit error: {0}")]
    AuditError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // STORAGE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Metadata or resource store reported a failure.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Persisted file was written by an incompatible format version.
    #[error("Format version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// File I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    // ═══════════════════════════════════════════════════════════════════════════
    // CONFIGURATION & INTERNAL ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Required setting is missing or unusable.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl PortalError {
    /// Wraps any failure raised during a reload as a `TransientLoad`.
    ///
    /// Errors that already describe a load failure are passed through.
    pub fn transient_load(scope: impl ToString, cause: PortalError) -> Self {
        match cause {
            e @ (PortalError::TransientLoad { .. } | PortalError::LoadTimeout { .. }) => e,
            other => PortalError::TransientLoad {
                scope: scope.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Wraps a store failure raised during an upload or delete.
    pub fn mutation(operation: impl Into<String>, cause: impl ToString) -> Self {
        PortalError::MutationError {
            operation: operation.into(),
            reason: cause.to_string(),
        }
    }

    /// Returns true if this error is recoverable (can retry).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PortalError::TransientLoad { .. }
                | PortalError::LoadTimeout { .. }
                | PortalError::IoError(_)
        )
    }

    /// Returns true if this is a validation error.
    pub fn is_validation_error(&self) -> bool {
        matches!(
            self,
            PortalError::ValidationError(_) | PortalError::PayloadTooLarge { .. }
        )
    }

    /// Returns true if this error came from the read path.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            PortalError::TransientLoad { .. } | PortalError::LoadTimeout { .. }
        )
    }
}
