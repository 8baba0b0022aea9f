//! Storage backends for the durable resource store
//!
//! A backend is a plain replace-in-place target: a write can fail part way
//! through and leave either the old bytes, the new bytes, or a mix behind.
//! The backup discipline lives one layer up in [`super::ResourceStore`].

use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

/// Addressable byte storage keyed by relative resource name
#[async_trait]
pub trait ResourceBackend: Send + Sync {
    /// Read a resource; `Ok(None)` when it does not exist
    async fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>>;

    /// Replace a resource with `bytes`, creating it if needed
    async fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()>;

    /// Remove a resource; `Ok(false)` when it did not exist
    async fn remove(&self, name: &str) -> io::Result<bool>;
}

/// Filesystem backend rooted at a directory
///
/// Resource `data/c-1.json` lives at `{root}/data/c-1.json`.
#[derive(Debug, Clone)]
pub struct FsBackend {
    root: PathBuf,
}

impl FsBackend {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resource_path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl ResourceBackend for FsBackend {
    async fn read(&self, name: &str) -> io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.resource_path(name)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> io::Result<()> {
        let path = self.resource_path(name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await
    }

    async fn remove(&self, name: &str) -> io::Result<bool> {
        match tokio::fs::remove_file(self.resource_path(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
