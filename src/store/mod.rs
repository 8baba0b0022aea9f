//! Durable Resource Store
//!
//! Persists single named resources (the page schema, one content item) with a
//! backup-then-write-then-restore-on-failure discipline. Every persisted file
//! goes through [`ResourceStore::write`].
//!
//! The store has no referential awareness: it does not know that the schema
//! points at content items. Keeping those consistent is the orchestrator's job.

pub mod backend;

pub use backend::{FsBackend, ResourceBackend};

use crate::error::{RestoreOutcome, StoreError, WriteFailure};
use serde::Serialize;
use std::path::{Component, Path};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Confirmation of a successful write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteAck {
    pub name: String,
    pub bytes_written: usize,
    /// Whether a previous version of the resource was replaced
    pub replaced: bool,
}

/// Failure-safe single resource store
#[derive(Clone)]
pub struct ResourceStore {
    backend: Arc<dyn ResourceBackend>,
}

impl ResourceStore {
    pub fn new(backend: Arc<dyn ResourceBackend>) -> Self {
        Self { backend }
    }

    /// Store rooted at a filesystem directory
    pub fn on_disk<P: AsRef<Path>>(root: P) -> Self {
        Self::new(Arc::new(FsBackend::new(root)))
    }

    /// Read a resource's bytes
    pub async fn read(&self, name: &str) -> Result<Vec<u8>, StoreError> {
        validate_name(name)?;
        self.backend
            .read(name)
            .await?
            .ok_or_else(|| StoreError::NotFound(name.to_string()))
    }

    pub async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        validate_name(name)?;
        Ok(self.backend.read(name).await?.is_some())
    }

    /// Write `payload` to `name`
    ///
    /// If the resource exists its current bytes are read into a backup first;
    /// a backup that cannot be read aborts the write before anything is
    /// touched. When the write reports failure the backup is written back
    /// (or, for a new resource, the partial file removed). A failing restore
    /// is not retried but is reported in the returned [`WriteFailure`].
    pub async fn write(&self, name: &str, payload: &[u8]) -> Result<WriteAck, StoreError> {
        validate_name(name)?;

        let backup = self.backend.read(name).await?;

        match self.backend.write(name, payload).await {
            Ok(()) => {
                debug!(resource = %name, bytes = payload.len(), "resource written");
                Ok(WriteAck {
                    name: name.to_string(),
                    bytes_written: payload.len(),
                    replaced: backup.is_some(),
                })
            }
            Err(write_err) => {
                warn!(resource = %name, error = %write_err, "write failed, restoring previous state");
                let restore = self.restore(name, backup).await;
                if restore.is_failed() {
                    error!(resource = %name, restore = %restore, "restore after failed write did not succeed");
                }
                Err(StoreError::WriteFailure(WriteFailure {
                    name: name.to_string(),
                    reason: write_err.to_string(),
                    attempted: payload.to_vec(),
                    restore,
                }))
            }
        }
    }

    /// Serialize `value` as pretty JSON and write it
    pub async fn write_json<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
    ) -> Result<WriteAck, StoreError> {
        let payload = serde_json::to_vec_pretty(value).map_err(|e| {
            StoreError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to serialize {}: {}", name, e),
            ))
        })?;
        self.write(name, &payload).await
    }

    /// Remove a resource
    pub async fn remove(&self, name: &str) -> Result<(), StoreError> {
        validate_name(name)?;
        if self.backend.remove(name).await? {
            debug!(resource = %name, "resource removed");
            Ok(())
        } else {
            Err(StoreError::NotFound(name.to_string()))
        }
    }

    async fn restore(&self, name: &str, backup: Option<Vec<u8>>) -> RestoreOutcome {
        match backup {
            Some(bytes) => match self.backend.write(name, &bytes).await {
                Ok(()) => RestoreOutcome::Restored,
                Err(e) => RestoreOutcome::Failed(e.to_string()),
            },
            None => match self.backend.remove(name).await {
                Ok(_) => RestoreOutcome::Cleared,
                Err(e) => RestoreOutcome::Failed(e.to_string()),
            },
        }
    }
}

/// Resource names are relative paths made of plain segments
fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    let path = Path::new(name);
    let plain = path
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !plain {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}
