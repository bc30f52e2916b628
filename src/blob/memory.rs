//! In-memory blob store (for testing/local development)

use bson::oid::ObjectId;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use super::{base_name, mime, BlobStore, UploadTicket};
use crate::types::BlobStoreError;

/// A blob held by [`InMemoryBlobStore`]
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Simple in-memory blob store
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<ObjectId, StoredBlob>>,
    failing: RwLock<HashSet<PathBuf>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every later upload of `path` fail with a write error
    pub async fn fail_uploads_for(&self, path: impl Into<PathBuf>) {
        self.failing.write().await.insert(path.into());
    }

    /// Look up a stored blob
    pub async fn blob(&self, oid: &ObjectId) -> Option<StoredBlob> {
        self.blobs.read().await.get(oid).cloned()
    }

    /// Number of stored blobs
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, path: &Path) -> Result<UploadTicket, BlobStoreError> {
        let ticket = UploadTicket::generate();
        let file = path.display().to_string();

        let data = tokio::fs::read(path)
            .await
            .map_err(|e| ticket.open_error(&file, e))?;

        if self.failing.read().await.contains(path) {
            return Err(ticket.write_error(&file, "injected write failure"));
        }

        let blob = StoredBlob {
            filename: base_name(path),
            content_type: mime::resolve(&file).to_string(),
            data: Bytes::from(data),
        };
        debug!(
            file = %file,
            oid = %ticket.oid,
            correlation = %ticket.correlation,
            "Blob stored in memory"
        );
        self.blobs.write().await.insert(ticket.oid, blob);

        Ok(ticket)
    }
}
