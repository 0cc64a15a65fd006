//! Batch import: manifest → files → records → store, with per-file history.

mod config;
mod error;
mod outcome;
mod runner;
mod summary;

pub use config::ImportConfig;
pub use error::FileError;
pub use outcome::{FileOutcome, ImportedFile};
pub use runner::ImportOrchestrator;
pub use summary::{BatchReport, BatchResult};
