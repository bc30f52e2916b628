//! GridFS blob store
//!
//! Streams image files into the default `fs` bucket of the import database.
//! Files are stored under the ticket's ObjectId with the base name as the
//! GridFS filename and the content type in the file metadata.

use bson::{doc, Bson};
use futures_util::io::AsyncWriteExt;
use mongodb::gridfs::{GridFsBucket, GridFsUploadStream};
use mongodb::Database;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use super::{base_name, mime, BlobStore, UploadTicket};
use crate::types::BlobStoreError;

/// Read buffer used while streaming a file into GridFS (256KB)
const COPY_BUFFER_SIZE: usize = 256 * 1024;

/// Blob store backed by a GridFS bucket
#[derive(Clone)]
pub struct GridFsBlobStore {
    bucket: GridFsBucket,
}

impl GridFsBlobStore {
    /// Use the default bucket of `database`
    pub fn new(database: &Database) -> Self {
        Self {
            bucket: database.gridfs_bucket(None),
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for GridFsBlobStore {
    async fn upload(&self, path: &Path) -> Result<UploadTicket, BlobStoreError> {
        let ticket = UploadTicket::generate();
        let file = path.display().to_string();
        info!(
            file = %file,
            oid = %ticket.oid,
            correlation = %ticket.correlation,
            "GridFS upload started"
        );

        let content_type = mime::resolve(&file);
        let mut source = File::open(path)
            .await
            .map_err(|e| ticket.open_error(&file, e))?;

        info!(
            file = %file,
            oid = %ticket.oid,
            correlation = %ticket.correlation,
            "GridFS stream opening"
        );
        let mut stream = self
            .bucket
            .open_upload_stream(base_name(path))
            .id(Bson::ObjectId(ticket.oid))
            .metadata(doc! {
                "contentType": content_type,
                "sourcePath": file.as_str(),
            })
            .await
            .map_err(|e| ticket.open_error(&file, e))?;

        info!(
            file = %file,
            oid = %ticket.oid,
            correlation = %ticket.correlation,
            "GridFS stream writing"
        );
        let written = match copy_into(&mut source, &mut stream).await {
            Ok(written) => written,
            Err(e) => {
                // Drop the chunks written so far
                if let Err(abort_err) = stream.abort().await {
                    warn!(
                        file = %file,
                        oid = %ticket.oid,
                        correlation = %ticket.correlation,
                        error = %abort_err,
                        "Failed to abort GridFS upload"
                    );
                }
                return Err(ticket.write_error(&file, e));
            }
        };

        stream
            .close()
            .await
            .map_err(|e| ticket.write_error(&file, e))?;

        info!(
            file = %file,
            oid = %ticket.oid,
            correlation = %ticket.correlation,
            content_type = %content_type,
            bytes = written,
            "GridFS upload complete"
        );

        Ok(ticket)
    }
}

async fn copy_into(source: &mut File, sink: &mut GridFsUploadStream) -> std::io::Result<u64> {
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = source.read(&mut buf).await?;
        if n == 0 {
            return Ok(total);
        }
        sink.write_all(&buf[..n]).await?;
        total += n as u64;
    }
}
