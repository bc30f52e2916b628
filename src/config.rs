//! Configuration for resume-import
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::services::ImportOrchestratorConfig;
use crate::types::EXIT_USAGE;

/// Literal that turns an invocation into a collection drop
pub const DROP_KEYWORD: &str = "DROP";

/// Resume JSON file -> MongoDB collection loader
///
/// Imports each input file as a new document, storing referenced images in
/// GridFS. Passing DROP instead of input files drops the collection.
#[derive(Parser, Debug, Clone)]
#[command(name = "resume-import", version)]
#[command(about = "Import resume JSON documents and their images into MongoDB")]
pub struct Args {
    /// Target database name
    pub database: String,

    /// Target collection name
    pub collection: String,

    /// Resume JSON files to import, or DROP to drop the collection
    #[arg(required = true, value_name = "INPUTFILE")]
    pub inputs: Vec<String>,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// Maximum concurrent image uploads per resume
    #[arg(long, env = "UPLOAD_CONCURRENCY", default_value = "8")]
    pub upload_concurrency: usize,

    /// Scale applied to the database statistics logged after each import
    #[arg(long, env = "STATS_SCALE", default_value = "1024")]
    pub stats_scale: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log line format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// What an invocation asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Import(Vec<PathBuf>),
    Drop,
}

impl Args {
    /// Interpret the positional inputs
    pub fn command(&self) -> Command {
        match self.inputs.first() {
            Some(first) if first.eq_ignore_ascii_case(DROP_KEYWORD) => Command::Drop,
            _ => Command::Import(self.inputs.iter().map(PathBuf::from).collect()),
        }
    }

    /// Orchestrator settings derived from the arguments
    pub fn orchestrator_config(&self) -> ImportOrchestratorConfig {
        ImportOrchestratorConfig {
            upload_concurrency: self.upload_concurrency,
            stats_scale: self.stats_scale,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.database.trim().is_empty() {
            return Err("database name must not be empty".to_string());
        }

        if self.collection.trim().is_empty() {
            return Err("collection name must not be empty".to_string());
        }

        if self.upload_concurrency == 0 {
            return Err("UPLOAD_CONCURRENCY must be at least 1".to_string());
        }

        if self.stats_scale == 0 {
            return Err("STATS_SCALE must be at least 1".to_string());
        }

        Ok(())
    }
}

/// Exit status for a command line clap refused to parse.
///
/// `--help` and `--version` also arrive as errors but are not failures.
pub fn parse_exit_status(err: &clap::Error) -> u8 {
    if err.use_stderr() {
        EXIT_USAGE
    } else {
        0
    }
}
