//! Artifact store for packet captures and TLS key logs.
//!
//! Artifacts are addressed by kind and an opaque storage id. Containers only
//! keep the id; nothing here knows about containers.

use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::ArtifactKind;

use super::storage::Storage;

/// Artifact store backed by S3.
#[derive(Clone)]
pub struct ArtifactStore {
    storage: Storage,
    max_size: usize,
}

impl ArtifactStore {
    pub fn new(storage: Storage, max_size: usize) -> Self {
        Self { storage, max_size }
    }

    /// Store an artifact and return its new storage id.
    pub async fn store(&self, kind: ArtifactKind, data: Vec<u8>) -> AppResult<Uuid> {
        check_upload_size(kind, data.len(), self.max_size)?;

        let storage_id = Uuid::now_v7();
        let size = data.len();
        let key = Storage::artifact_key(kind.as_str(), &storage_id.to_string());

        self.storage
            .put(&key, data, Some(kind.content_type()))
            .await?;

        info!(kind = %kind, storage_id = %storage_id, size, "Stored artifact");

        Ok(storage_id)
    }

    /// Fetch an artifact's bytes.
    pub async fn fetch(&self, kind: ArtifactKind, storage_id: Uuid) -> AppResult<Vec<u8>> {
        let key = Storage::artifact_key(kind.as_str(), &storage_id.to_string());
        let (data, _content_type) = self.storage.get(&key).await?;
        Ok(data)
    }

    pub async fn exists(&self, kind: ArtifactKind, storage_id: Uuid) -> AppResult<bool> {
        let key = Storage::artifact_key(kind.as_str(), &storage_id.to_string());
        self.storage.exists(&key).await
    }
}

/// Reject empty uploads and uploads above the configured limit.
pub fn check_upload_size(kind: ArtifactKind, size: usize, max_size: usize) -> AppResult<()> {
    if size == 0 {
        return Err(AppError::InvalidInput(format!("{} artifact is empty", kind)));
    }
    if size > max_size {
        return Err(AppError::InvalidInput(format!(
            "{} artifact is {} bytes, limit is {} bytes",
            kind, size, max_size
        )));
    }
    Ok(())
}
