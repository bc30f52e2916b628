//! In-memory document store (for testing/local development)
//!
//! All sessions opened by one connector share the same databases and blob
//! store, the way separate connections to one server would.

use bson::{doc, oid::ObjectId, Bson, Document};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{Connector, DocumentStore};
use crate::blob::{BlobStore, InMemoryBlobStore};
use crate::types::{ImportError, Result};

type Collections = HashMap<String, Vec<Document>>;

#[derive(Default)]
struct Shared {
    databases: RwLock<HashMap<String, Collections>>,
    blobs: Arc<InMemoryBlobStore>,
    connects: AtomicUsize,
    open: AtomicUsize,
}

/// Connector handing out [`InMemorySession`]s
#[derive(Clone, Default)]
pub struct InMemoryConnector {
    shared: Arc<Shared>,
    refuse_connections: bool,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connector whose every connection attempt fails
    pub fn refusing() -> Self {
        Self {
            refuse_connections: true,
            ..Self::default()
        }
    }

    /// Blob store shared by all sessions
    pub fn blobs(&self) -> Arc<InMemoryBlobStore> {
        Arc::clone(&self.shared.blobs)
    }

    /// Documents currently stored in `database.collection`
    pub async fn documents(&self, database: &str, collection: &str) -> Vec<Document> {
        self.shared
            .databases
            .read()
            .await
            .get(database)
            .and_then(|collections| collections.get(collection))
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `database.collection` exists
    pub async fn has_collection(&self, database: &str, collection: &str) -> bool {
        self.shared
            .databases
            .read()
            .await
            .get(database)
            .is_some_and(|collections| collections.contains_key(collection))
    }

    /// Number of connection attempts so far
    pub fn connect_count(&self) -> usize {
        self.shared.connects.load(Ordering::SeqCst)
    }

    /// Number of sessions not yet closed
    pub fn open_sessions(&self) -> usize {
        self.shared.open.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Connector for InMemoryConnector {
    async fn connect(&self, database: &str) -> Result<Box<dyn DocumentStore>> {
        self.shared.connects.fetch_add(1, Ordering::SeqCst);
        if self.refuse_connections {
            return Err(ImportError::Connection(format!(
                "in-memory connection to '{}' refused",
                database
            )));
        }

        self.shared.open.fetch_add(1, Ordering::SeqCst);
        debug!(database = %database, "In-memory session opened");
        Ok(Box::new(InMemorySession {
            database: database.to_string(),
            shared: Arc::clone(&self.shared),
        }))
    }
}

/// One open in-memory connection
pub struct InMemorySession {
    database: String,
    shared: Arc<Shared>,
}

#[async_trait::async_trait]
impl DocumentStore for InMemorySession {
    fn blob_store(&self) -> &dyn BlobStore {
        self.shared.blobs.as_ref()
    }

    async fn insert_document(&self, collection: &str, mut document: Document) -> Result<Bson> {
        let id = match document.get("_id") {
            Some(id) => id.clone(),
            None => {
                let id = Bson::ObjectId(ObjectId::new());
                document.insert("_id", id.clone());
                id
            }
        };

        self.shared
            .databases
            .write()
            .await
            .entry(self.database.clone())
            .or_default()
            .entry(collection.to_string())
            .or_default()
            .push(document);

        Ok(id)
    }

    async fn stats(&self, scale: u32) -> Result<Document> {
        let databases = self.shared.databases.read().await;
        let (collections, objects) = databases.get(&self.database).map_or((0, 0), |c| {
            (c.len(), c.values().map(Vec::len).sum::<usize>())
        });

        Ok(doc! {
            "db": self.database.as_str(),
            "collections": collections as i64,
            "objects": objects as i64,
            "scaleFactor": scale as i64,
        })
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        if let Some(collections) = self.shared.databases.write().await.get_mut(&self.database) {
            collections.remove(collection);
        }
        Ok(())
    }

    async fn close(&self) {
        self.shared.open.fetch_sub(1, Ordering::SeqCst);
        debug!(database = %self.database, "In-memory session closed");
    }
}
