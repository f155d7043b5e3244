//! Directory-backed physical resource store.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{debug, instrument};
use uuid::Uuid;

use portal_core::error::{PortalError, Result};
use portal_core::traits::ResourceStore;
use portal_core::types::{sanitize_file_name, ResourceLocation};

/// Stores uploaded files flat inside one root directory.
///
/// Locations are `<uuid>_<sanitized name>`, relative to the root.
#[derive(Clone, Debug)]
pub struct FileResourceStore {
    root: PathBuf,
}

impl FileResourceStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a location to a path under the root.
    ///
    /// Only single plain file names are accepted; anything that could escape
    /// the root is a validation error.
    pub fn path_of(&self, location: &ResourceLocation) -> Result<PathBuf> {
        let relative = Path::new(location.as_str());
        let mut components = relative.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.root.join(name)),
            _ => Err(PortalError::ValidationError(format!(
                "resource location {:?} is not a plain file name",
                location.as_str()
            ))),
        }
    }
}

#[async_trait]
impl ResourceStore for FileResourceStore {
    #[instrument(skip(self, bytes), fields(root = ?self.root, size = bytes.len()))]
    async fn put(&self, bytes: &[u8], suggested_name: &str) -> Result<ResourceLocation> {
        let name = sanitize_file_name(suggested_name)?;
        let location = ResourceLocation::new(format!("{}_{}", Uuid::new_v4().simple(), name));
        let path = self.path_of(&location)?;

        fs::create_dir_all(&self.root).await?;
        fs::write(&path, bytes).await?;

        debug!(%location, "resource stored");
        Ok(location)
    }

    #[instrument(skip(self), fields(root = ?self.root))]
    async fn delete(&self, location: &ResourceLocation) -> Result<bool> {
        let path = self.path_of(location)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(%location, "resource removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, location: &ResourceLocation) -> Result<bool> {
        let path = self.path_of(location)?;
        Ok(fs::try_exists(&path).await?)
    }
}
