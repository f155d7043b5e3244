//! Physical resources and pending uploads.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::MAX_FILE_NAME_LEN;
use crate::error::{PortalError, Result};

/// Location of a stored physical resource, as issued by a resource store.
///
/// Opaque to everything except the store that generated it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceLocation(String);

impl ResourceLocation {
    /// Wraps a store-issued location.
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    /// Returns the location as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reduces a caller-supplied file name to something safe to embed in a
/// generated resource name.
///
/// Only the final path component survives. Characters other than
/// alphanumerics, `.`, `-` and `_` become `_`, leading dots are dropped, and
/// the result is capped at [`MAX_FILE_NAME_LEN`] characters.
pub fn sanitize_file_name(name: &str) -> Result<String> {
    let last = name
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .skip_while(|c| *c == '.')
        .take(MAX_FILE_NAME_LEN)
        .collect();

    if cleaned.is_empty() {
        return Err(PortalError::ValidationError(format!(
            "file name {:?} has no usable characters",
            name
        )));
    }
    Ok(cleaned)
}

/// A file handed in for upload.
#[derive(Clone, Debug)]
pub struct UploadFile {
    /// Name as supplied by the caller (never used verbatim on disk)
    pub name: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl UploadFile {
    /// Creates an upload from a caller-supplied name and its contents.
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true for an empty payload.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// One upload in flight: the physical payload plus the metadata draft.
///
/// Exists only for the duration of a single mutation call.
#[derive(Clone, Debug)]
pub struct PendingWrite<D> {
    /// File to persist in the resource store
    pub file: UploadFile,
    /// Descriptive fields of the metadata record
    pub draft: D,
}

impl<D> PendingWrite<D> {
    /// Pairs a file with its metadata draft.
    pub fn new(file: UploadFile, draft: D) -> Self {
        Self { file, draft }
    }
}
