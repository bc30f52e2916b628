//! resume-import - Resume JSON file -> MongoDB collection loader
//!
//! Reads resume documents from JSON files, uploads the images they reference
//! into GridFS, and inserts each resume as one document whose image entries
//! carry the stored blob's ObjectId.
//!
//! ## Modules
//!
//! - **record**: JSON parsing and creation timestamps
//! - **blob**: GridFS and in-memory blob stores, content type lookup
//! - **db**: per-run MongoDB connections and an in-memory stand-in
//! - **services**: image attachment fan-out and the import orchestrator

pub mod app;
pub mod blob;
pub mod config;
pub mod db;
pub mod logging;
pub mod record;
pub mod services;
pub mod types;

pub use app::{run, run_with};
pub use config::Args;
pub use types::{ImportError, Result};
