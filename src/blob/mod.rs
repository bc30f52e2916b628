//! Blob storage for resume images
//!
//! Each referenced image is uploaded once under a freshly generated
//! ObjectId. Backends:
//!
//! - **GridFs**: MongoDB GridFS bucket on the import connection
//! - **InMemory**: process-local store for tests and dry runs

pub mod gridfs;
pub mod memory;
pub mod mime;

pub use gridfs::GridFsBlobStore;
pub use memory::{InMemoryBlobStore, StoredBlob};

use bson::oid::ObjectId;
use std::fmt::Display;
use std::path::Path;
use uuid::Uuid;

use crate::types::BlobStoreError;

/// Identifiers generated for one upload before any I/O happens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadTicket {
    /// Identifier the blob is stored under
    pub oid: ObjectId,
    /// Token correlating the log lines of this upload
    pub correlation: Uuid,
}

impl UploadTicket {
    pub fn generate() -> Self {
        Self {
            oid: ObjectId::new(),
            correlation: Uuid::new_v4(),
        }
    }

    pub fn open_error(&self, file: &str, err: impl Display) -> BlobStoreError {
        BlobStoreError::Open {
            file: file.to_string(),
            oid: self.oid,
            correlation: self.correlation,
            message: err.to_string(),
        }
    }

    pub fn write_error(&self, file: &str, err: impl Display) -> BlobStoreError {
        BlobStoreError::Write {
            file: file.to_string(),
            oid: self.oid,
            correlation: self.correlation,
            message: err.to_string(),
        }
    }
}

/// Trait for blob storage (allows different backends)
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Upload the file at `path`, resolving once the store acknowledged it.
    ///
    /// Single attempt; the returned ticket carries the stored identifier.
    async fn upload(&self, path: &Path) -> Result<UploadTicket, BlobStoreError>;
}

/// File name stored alongside the blob
pub(crate) fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
