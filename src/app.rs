//! Top-level run loop: dispatch the parsed command to the orchestrator

use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{Args, Command};
use crate::db::{Connector, MongoConnector};
use crate::services::ImportOrchestrator;
use crate::types::Result;

/// Run against the MongoDB server named by `--mongodb-uri`
pub async fn run(args: &Args) -> Result<()> {
    run_with(MongoConnector::new(args.mongodb_uri.clone()), args).await
}

/// Run against any connector
pub async fn run_with<C: Connector>(connector: C, args: &Args) -> Result<()> {
    let orchestrator = ImportOrchestrator::new(args.orchestrator_config(), Arc::new(connector));

    match args.command() {
        Command::Drop => {
            if args.inputs.len() > 1 {
                warn!(ignored = args.inputs.len() - 1, "Extra arguments after DROP ignored");
            }
            orchestrator
                .drop_collection(&args.database, &args.collection)
                .await
        }
        Command::Import(paths) => {
            let outcomes = orchestrator
                .import_files(&args.database, &args.collection, &paths)
                .await?;
            info!(
                database = %args.database,
                collection = %args.collection,
                files = outcomes.len(),
                images = outcomes.iter().map(|o| o.images_attached).sum::<usize>(),
                "All files imported"
            );
            Ok(())
        }
    }
}
