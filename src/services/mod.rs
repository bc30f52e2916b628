//! Services layer for resume-import
//!
//! ## Services
//!
//! - **Attachments**: concurrent image upload and identifier back-patching
//! - **ImportOrchestrator**: per-file import pipeline and collection drop

pub mod attachments;
pub mod import_orchestrator;

pub use attachments::attach_images;
pub use import_orchestrator::{ImportOrchestrator, ImportOrchestratorConfig, ImportOutcome};
