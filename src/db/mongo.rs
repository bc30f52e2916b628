//! MongoDB client wrapper
//!
//! One [`MongoClient`] per import run: the target database plus the GridFS
//! bucket that images are streamed into.

use bson::{doc, Bson, Document};
use mongodb::{Client, Database};
use tracing::{debug, info};

use super::{Connector, DocumentStore};
use crate::blob::{BlobStore, GridFsBlobStore};
use crate::types::{ImportError, Result};

/// MongoDB client bound to one database
#[derive(Clone)]
pub struct MongoClient {
    client: Client,
    db_name: String,
    blobs: GridFsBlobStore,
}

impl MongoClient {
    /// Create a new MongoDB client
    pub async fn new(uri: &str, db_name: &str) -> Result<Self> {
        info!("Connecting to MongoDB at {}", uri);

        // Use serverSelectionTimeoutMS to avoid hanging on unreachable MongoDB
        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| ImportError::Connection(format!("Failed to connect to MongoDB: {}", e)))?;

        // Verify the server is reachable before any upload starts
        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| ImportError::Connection(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        let blobs = GridFsBlobStore::new(&client.database(db_name));
        Ok(Self {
            client,
            db_name: db_name.to_string(),
            blobs,
        })
    }

    /// Get the target database
    pub fn database(&self) -> Database {
        self.client.database(&self.db_name)
    }
}

#[async_trait::async_trait]
impl DocumentStore for MongoClient {
    fn blob_store(&self) -> &dyn BlobStore {
        &self.blobs
    }

    async fn insert_document(&self, collection: &str, document: Document) -> Result<Bson> {
        let result = self
            .database()
            .collection::<Document>(collection)
            .insert_one(document)
            .await
            .map_err(|e| {
                ImportError::Persistence(format!("Insert into '{}' failed: {}", collection, e))
            })?;

        Ok(result.inserted_id)
    }

    async fn stats(&self, scale: u32) -> Result<Document> {
        self.database()
            .run_command(doc! { "dbStats": 1, "scale": scale as i64 })
            .await
            .map_err(|e| {
                ImportError::Stats(format!("dbStats on '{}' failed: {}", self.db_name, e))
            })
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        self.database()
            .collection::<Document>(collection)
            .drop()
            .await
            .map_err(|e| {
                ImportError::Persistence(format!("Drop of '{}' failed: {}", collection, e))
            })
    }

    async fn close(&self) {
        self.client.clone().shutdown().await;
        debug!(database = %self.db_name, "MongoDB connection closed");
    }
}

/// Opens a fresh [`MongoClient`] per run
#[derive(Debug, Clone)]
pub struct MongoConnector {
    uri: String,
}

impl MongoConnector {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[async_trait::async_trait]
impl Connector for MongoConnector {
    async fn connect(&self, database: &str) -> Result<Box<dyn DocumentStore>> {
        let client = MongoClient::new(&self.uri, database).await?;
        Ok(Box::new(client))
    }
}
