//! Shared types for resume-import

pub mod error;

pub use error::{BlobStoreError, ImportError, Result, EXIT_PARSE, EXIT_RUNTIME, EXIT_USAGE};
