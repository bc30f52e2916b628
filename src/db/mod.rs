//! Database layer for resume-import
//!
//! One connection is opened per orchestrator run. The connection owns the
//! target database and the blob store that images are uploaded into.

pub mod memory;
pub mod mongo;

pub use memory::{InMemoryConnector, InMemorySession};
pub use mongo::{MongoClient, MongoConnector};

use bson::{Bson, Document};

use crate::blob::BlobStore;
use crate::types::Result;

/// An open connection to one database
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Blob store living on this connection
    fn blob_store(&self) -> &dyn BlobStore;

    /// Insert `document` into `collection`, returning its `_id`
    async fn insert_document(&self, collection: &str, document: Document) -> Result<Bson>;

    /// Database statistics, sizes divided by `scale`
    async fn stats(&self, scale: u32) -> Result<Document>;

    /// Drop `collection` entirely; a missing collection is not an error
    async fn drop_collection(&self, collection: &str) -> Result<()>;

    /// Release the connection
    async fn close(&self);
}

/// Opens connections to a named database
#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, database: &str) -> Result<Box<dyn DocumentStore>>;
}
