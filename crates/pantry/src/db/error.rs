use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cannot prepare database directory '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Migration {version} failed: {reason}")]
    Migration { version: u32, reason: String },

    /// A stored value no longer maps onto its domain type.
    #[error("Corrupt value in column '{column}': {reason}")]
    Corrupt { column: String, reason: String },

    #[error("Database lock poisoned")]
    LockPoisoned,
}
