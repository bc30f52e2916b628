//! Error types for resume-import
//!
//! Every failure in the pipeline propagates up to `main`, which maps the
//! error kind onto a process exit status.

use bson::oid::ObjectId;
use uuid::Uuid;

/// Exit status for a malformed command line
pub const EXIT_USAGE: u8 = 253;

/// Exit status for an input document that is not valid JSON
pub const EXIT_PARSE: u8 = 254;

/// Exit status for any runtime, store, or database failure
pub const EXIT_RUNTIME: u8 = 255;

/// Failure raised by a blob store while uploading one file
#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("Blob store open failed for {file} (oid {oid}, correlation {correlation}): {message}")]
    Open {
        file: String,
        oid: ObjectId,
        correlation: Uuid,
        message: String,
    },

    #[error("Blob store write failed for {file} (oid {oid}, correlation {correlation}): {message}")]
    Write {
        file: String,
        oid: ObjectId,
        correlation: Uuid,
        message: String,
    },
}

impl BlobStoreError {
    /// Identifier that was generated for the failed upload
    pub fn oid(&self) -> ObjectId {
        match self {
            Self::Open { oid, .. } | Self::Write { oid, .. } => *oid,
        }
    }

    /// Correlation token of the failed upload
    pub fn correlation(&self) -> Uuid {
        match self {
            Self::Open { correlation, .. } | Self::Write { correlation, .. } => *correlation,
        }
    }
}

/// Main error type for import operations
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Parse error in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    #[error("Input error reading {path}: {source}")]
    Input {
        path: String,
        source: std::io::Error,
    },

    #[error("Blob upload failed for {file}: {source}")]
    BlobUpload {
        file: String,
        source: BlobStoreError,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Stats error: {0}")]
    Stats(String),

    #[error("Import of {0} stopped after another file failed")]
    Aborted(String),
}

impl ImportError {
    /// Convert error to a process exit status
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            Self::Parse { .. } => EXIT_PARSE,
            Self::Input { .. } => EXIT_RUNTIME,
            Self::BlobUpload { .. } => EXIT_RUNTIME,
            Self::Persistence(_) => EXIT_RUNTIME,
            Self::Connection(_) => EXIT_RUNTIME,
            Self::Stats(_) => EXIT_RUNTIME,
            Self::Aborted(_) => EXIT_RUNTIME,
        }
    }
}

/// Result type alias for import operations
pub type Result<T> = std::result::Result<T, ImportError>;
