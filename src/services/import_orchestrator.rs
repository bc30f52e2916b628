//! Import Orchestrator - one resume file into one document
//!
//! ## Pipeline
//!
//! ```text
//! input file ─► Record::load ─► connect ─► attach_images ─► insert_document ─► stats ─► close
//!                   │                          │
//!              (parse error:             (GridFS fan-out,
//!               no connection)            fan-in barrier)
//! ```
//!
//! Each file gets its own connection. A failure at any stage ends the run
//! with nothing inserted, and the connection is released either way.
//!
//! When several files are imported together, the first failure raises an
//! abort signal. Sibling runs stop at their next stage boundary and still
//! close their connection before `import_files` returns.

use bson::{Bson, Document};
use futures::stream::{FuturesUnordered, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::attachments::attach_images;
use crate::db::{Connector, DocumentStore};
use crate::record::Record;
use crate::types::{ImportError, Result};

// ============================================================================
// Types
// ============================================================================

/// Configuration for the import orchestrator
#[derive(Debug, Clone)]
pub struct ImportOrchestratorConfig {
    /// Maximum image uploads in flight per record
    pub upload_concurrency: usize,
    /// Divisor applied to the sizes reported after an insert
    pub stats_scale: u32,
}

impl Default for ImportOrchestratorConfig {
    fn default() -> Self {
        Self {
            upload_concurrency: 8,
            stats_scale: 1024,
        }
    }
}

/// Result of importing one file
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub source: PathBuf,
    pub inserted_id: Bson,
    pub images_attached: usize,
    pub stats: Document,
}

/// Raised once one run of a batch has failed
#[derive(Clone)]
struct AbortSignal(watch::Receiver<bool>);

impl AbortSignal {
    /// Signal that is never raised
    fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self(rx)
    }

    fn is_raised(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once raised; pends forever if the sender is gone
    async fn raised(&mut self) {
        if self.0.wait_for(|raised| *raised).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

// ============================================================================
// Import Orchestrator
// ============================================================================

/// Import Orchestrator Service
///
/// Sequences load, image upload, and insert for each input file against a
/// connection opened through `C`.
pub struct ImportOrchestrator<C: Connector> {
    config: ImportOrchestratorConfig,
    connector: Arc<C>,
}

impl<C: Connector> ImportOrchestrator<C> {
    /// Create a new import orchestrator
    pub fn new(config: ImportOrchestratorConfig, connector: Arc<C>) -> Self {
        Self { config, connector }
    }

    /// Import every file concurrently.
    ///
    /// Fails with the first error. The remaining runs are told to stop and
    /// awaited, so every connection they opened is closed before returning.
    pub async fn import_files(
        &self,
        database: &str,
        collection: &str,
        paths: &[PathBuf],
    ) -> Result<Vec<ImportOutcome>> {
        let (abort_tx, abort_rx) = watch::channel(false);
        let mut runs: FuturesUnordered<_> = paths
            .iter()
            .enumerate()
            .map(|(index, path)| {
                let abort = AbortSignal(abort_rx.clone());
                async move { (index, self.run(database, collection, path, abort).await) }
            })
            .collect();

        let mut outcomes: Vec<Option<ImportOutcome>> = vec![None; paths.len()];
        let mut first_error = None;
        while let Some((index, result)) = runs.next().await {
            match result {
                Ok(outcome) => outcomes[index] = Some(outcome),
                Err(e) if first_error.is_none() => {
                    warn!(
                        file = %paths[index].display(),
                        error = %e,
                        "Import failed, stopping remaining files"
                    );
                    let _ = abort_tx.send(true);
                    first_error = Some(e);
                }
                Err(e) => {
                    debug!(file = %paths[index].display(), error = %e, "Later import failure")
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outcomes.into_iter().flatten().collect()),
        }
    }

    /// Import one file as a new document of `database.collection`
    pub async fn import_file(
        &self,
        database: &str,
        collection: &str,
        path: &Path,
    ) -> Result<ImportOutcome> {
        self.run(database, collection, path, AbortSignal::never()).await
    }

    /// One file's pipeline; fails with `Aborted` when stopped by `abort`
    async fn run(
        &self,
        database: &str,
        collection: &str,
        path: &Path,
        mut abort: AbortSignal,
    ) -> Result<ImportOutcome> {
        let source_name = path.display().to_string();
        info!(file = %source_name, "Importing file");

        let raw = tokio::fs::read(path)
            .await
            .map_err(|source| ImportError::Input {
                path: source_name.clone(),
                source,
            })?;

        // Parse before connecting so bad input never touches the database
        let record = Record::load(&raw, &source_name)?;

        if abort.is_raised() {
            return Err(ImportError::Aborted(source_name));
        }

        let store = self.connector.connect(database).await?;
        info!(
            database = %database,
            collection = %collection,
            file = %source_name,
            title = record.title().unwrap_or_default(),
            "Connected for import"
        );

        let result = tokio::select! {
            biased;
            _ = abort.raised() => None,
            result = self.persist(store.as_ref(), collection, record) => Some(result),
        };
        store.close().await;

        let Some(result) = result else {
            info!(file = %source_name, "Import stopped after another file failed");
            return Err(ImportError::Aborted(source_name));
        };

        let (inserted_id, images_attached, stats) = result?;
        info!(
            file = %source_name,
            inserted_id = %inserted_id,
            images = images_attached,
            stats = %Bson::Document(stats.clone()).into_relaxed_extjson(),
            "Import complete"
        );

        Ok(ImportOutcome {
            source: path.to_path_buf(),
            inserted_id,
            images_attached,
            stats,
        })
    }

    async fn persist(
        &self,
        store: &dyn DocumentStore,
        collection: &str,
        mut record: Record,
    ) -> Result<(Bson, usize, Document)> {
        let images_attached =
            attach_images(store.blob_store(), &mut record, self.config.upload_concurrency).await?;

        let inserted_id = store
            .insert_document(collection, record.into_document())
            .await?;
        debug!(collection = %collection, inserted_id = %inserted_id, "Document inserted");

        let stats = store.stats(self.config.stats_scale).await?;
        Ok((inserted_id, images_attached, stats))
    }

    /// Drop `database.collection` entirely. No confirmation; irreversible.
    pub async fn drop_collection(&self, database: &str, collection: &str) -> Result<()> {
        let store = self.connector.connect(database).await?;
        info!(database = %database, collection = %collection, "Connected for drop");

        let result = store.drop_collection(collection).await;
        store.close().await;
        result?;

        info!(database = %database, collection = %collection, "Collection dropped");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::BlobStore;
    use crate::db::InMemoryConnector;
    use crate::record::{IMAGE_OID_FIELD, INSERT_TIMESTAMP_FIELD, UPDATE_TIMESTAMP_FIELD};
    use crate::types::{EXIT_PARSE, EXIT_RUNTIME};
    use std::fs;
    use std::time::Duration;

    /// Connector whose sessions insert slowly and reject documents titled "Bad"
    struct SlowInsertConnector {
        inner: InMemoryConnector,
    }

    struct SlowInsertSession {
        inner: Box<dyn DocumentStore>,
    }

    #[async_trait::async_trait]
    impl Connector for SlowInsertConnector {
        async fn connect(&self, database: &str) -> Result<Box<dyn DocumentStore>> {
            let inner = self.inner.connect(database).await?;
            Ok(Box::new(SlowInsertSession { inner }))
        }
    }

    #[async_trait::async_trait]
    impl DocumentStore for SlowInsertSession {
        fn blob_store(&self) -> &dyn BlobStore {
            self.inner.blob_store()
        }

        async fn insert_document(&self, collection: &str, document: Document) -> Result<Bson> {
            if document.get_str("title").ok() == Some("Bad") {
                tokio::time::sleep(Duration::from_millis(50)).await;
                return Err(ImportError::Persistence("document rejected".into()));
            }
            tokio::time::sleep(Duration::from_millis(500)).await;
            self.inner.insert_document(collection, document).await
        }

        async fn stats(&self, scale: u32) -> Result<Document> {
            self.inner.stats(scale).await
        }

        async fn drop_collection(&self, collection: &str) -> Result<()> {
            self.inner.drop_collection(collection).await
        }

        async fn close(&self) {
            self.inner.close().await
        }
    }

    fn orchestrator(connector: &InMemoryConnector) -> ImportOrchestrator<InMemoryConnector> {
        ImportOrchestrator::new(
            ImportOrchestratorConfig::default(),
            Arc::new(connector.clone()),
        )
    }

    #[tokio::test]
    async fn test_import_without_images() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("plain.json");
        fs::write(&input, r#"{"title":"Plain","skills":["rust","go"]}"#).unwrap();

        let connector = InMemoryConnector::new();
        let outcome = orchestrator(&connector)
            .import_file("resumes", "people", &input)
            .await
            .unwrap();

        assert_eq!(outcome.images_attached, 0);
        let docs = connector.documents("resumes", "people").await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("_id"), Some(&outcome.inserted_id));
        assert_eq!(docs[0].get_str("title").unwrap(), "Plain");
        assert!(docs[0].get_datetime(INSERT_TIMESTAMP_FIELD).is_ok());
        assert_eq!(docs[0].get(UPDATE_TIMESTAMP_FIELD), Some(&Bson::Null));
        assert!(connector.blobs().is_empty().await);
        assert_eq!(connector.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_import_attaches_image_oids() {
        let dir = tempfile::tempdir().unwrap();
        let image = dir.path().join("a.png");
        fs::write(&image, b"fake png").unwrap();
        let input = dir.path().join("resume.json");
        let json = serde_json::json!({
            "title": "A",
            "person": { "images": [{ "file": image.to_str().unwrap() }] }
        });
        fs::write(&input, json.to_string()).unwrap();

        let connector = InMemoryConnector::new();
        let outcome = orchestrator(&connector)
            .import_file("resumes", "people", &input)
            .await
            .unwrap();

        assert_eq!(outcome.images_attached, 1);
        let docs = connector.documents("resumes", "people").await;
        let images = docs[0]
            .get_document("person")
            .unwrap()
            .get_array("images")
            .unwrap();
        let oid = images[0]
            .as_document()
            .unwrap()
            .get_object_id(IMAGE_OID_FIELD)
            .unwrap();

        let blob = connector.blobs().blob(&oid).await.unwrap();
        assert_eq!(blob.content_type, "image/png");
        assert_eq!(blob.filename, "a.png");
    }

    #[tokio::test]
    async fn test_parse_error_never_connects() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("broken.json");
        fs::write(&input, "{ not json").unwrap();

        let connector = InMemoryConnector::new();
        let err = orchestrator(&connector)
            .import_file("resumes", "people", &input)
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), EXIT_PARSE);
        assert_eq!(connector.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_input_file() {
        let connector = InMemoryConnector::new();
        let err = orchestrator(&connector)
            .import_file("resumes", "people", Path::new("/nonexistent/resume.json"))
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Input { .. }));
        assert_eq!(err.exit_code(), EXIT_RUNTIME);
        assert_eq!(connector.connect_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_upload_persists_nothing_and_releases_connection() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.png");
        fs::write(&good, b"ok").unwrap();
        let input = dir.path().join("resume.json");
        let json = serde_json::json!({
            "title": "B",
            "person": { "images": [
                { "file": good.to_str().unwrap() },
                { "file": dir.path().join("missing.gif").to_str().unwrap() }
            ] }
        });
        fs::write(&input, json.to_string()).unwrap();

        let connector = InMemoryConnector::new();
        let err = orchestrator(&connector)
            .import_file("resumes", "people", &input)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ImportError::BlobUpload { ref file, .. } if file.ends_with("missing.gif")
        ));
        assert!(connector.documents("resumes", "people").await.is_empty());
        assert_eq!(connector.connect_count(), 1);
        assert_eq!(connector.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_import_files_returns_outcomes_in_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let paths: Vec<PathBuf> = (0..3)
            .map(|i| {
                let path = dir.path().join(format!("r{i}.json"));
                fs::write(&path, format!(r#"{{"title":"R{i}"}}"#)).unwrap();
                path
            })
            .collect();

        let connector = InMemoryConnector::new();
        let outcomes = orchestrator(&connector)
            .import_files("resumes", "people", &paths)
            .await
            .unwrap();

        let sources: Vec<_> = outcomes.iter().map(|o| o.source.clone()).collect();
        assert_eq!(sources, paths);
        assert_eq!(connector.open_sessions(), 0);
    }

    #[tokio::test]
    async fn test_failure_closes_slow_sibling_connection() {
        let dir = tempfile::tempdir().unwrap();
        let slow = dir.path().join("slow.json");
        fs::write(&slow, r#"{"title":"Slow"}"#).unwrap();
        let bad = dir.path().join("bad.json");
        fs::write(&bad, r#"{"title":"Bad"}"#).unwrap();

        let connector = InMemoryConnector::new();
        let orchestrator = ImportOrchestrator::new(
            ImportOrchestratorConfig::default(),
            Arc::new(SlowInsertConnector {
                inner: connector.clone(),
            }),
        );

        let started = std::time::Instant::now();
        let err = orchestrator
            .import_files("resumes", "people", &[slow, bad])
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Persistence(_)));
        assert!(started.elapsed() < Duration::from_millis(500));
        assert_eq!(connector.connect_count(), 2);
        assert_eq!(connector.open_sessions(), 0);
        assert!(connector.documents("resumes", "people").await.is_empty());
    }

    #[tokio::test]
    async fn test_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("plain.json");
        fs::write(&input, r#"{"title":"Plain"}"#).unwrap();

        let connector = InMemoryConnector::refusing();
        let err = orchestrator(&connector)
            .import_file("resumes", "people", &input)
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::Connection(_)));
        assert_eq!(err.exit_code(), EXIT_RUNTIME);
    }

    #[tokio::test]
    async fn test_drop_collection() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("plain.json");
        fs::write(&input, r#"{"title":"Plain"}"#).unwrap();

        let connector = InMemoryConnector::new();
        let orchestrator = orchestrator(&connector);
        orchestrator.import_file("resumes", "people", &input).await.unwrap();
        orchestrator.import_file("resumes", "people", &input).await.unwrap();
        assert_eq!(connector.documents("resumes", "people").await.len(), 2);

        orchestrator.drop_collection("resumes", "people").await.unwrap();
        assert!(connector.documents("resumes", "people").await.is_empty());
        assert!(!connector.has_collection("resumes", "people").await);

        // Dropping again is a no-op
        tokio_test::assert_ok!(orchestrator.drop_collection("resumes", "people").await);
        assert_eq!(connector.open_sessions(), 0);
    }
}
