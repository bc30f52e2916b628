//! resume-import - Resume JSON file -> MongoDB collection loader

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};

use resume_import::{
    config::{parse_exit_status, Args},
    logging,
    types::ImportError,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    // Parse command line arguments
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_exit_status(&e));
        }
    };

    logging::init(&args.log_level, args.log_format);

    // Validate configuration
    if let Err(e) = args.validate() {
        let err = ImportError::Usage(e);
        error!("Configuration error: {}", err);
        return ExitCode::from(err.exit_code());
    }

    info!(
        database = %args.database,
        collection = %args.collection,
        inputs = args.inputs.len(),
        mongodb = %args.mongodb_uri,
        "resume-import starting"
    );

    match resume_import::run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_failure(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn report_failure(err: &ImportError) {
    match err {
        ImportError::BlobUpload { file, source } => error!(
            file = %file,
            oid = %source.oid(),
            correlation = %source.correlation(),
            error = %err,
            exit_code = err.exit_code(),
            "Import failed"
        ),
        _ => error!(error = %err, exit_code = err.exit_code(), "Import failed"),
    }
}
