use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PantryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("History error: {0}")]
    History(#[from] crate::history::HistoryError),

    #[error("Alert setup failed: {0}")]
    Alert(#[from] crate::alert::AlertError),

    #[error("Search error: {0}")]
    Search(#[from] crate::search::SearchError),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid filename pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid URL for '{field}': {reason}")]
    InvalidUrl { field: String, reason: String },
}

/// Failure to reach the remote manifest or a listed file.
///
/// Every variant is a "source unavailable" condition: at manifest level it
/// aborts the batch, at file level it fails only that file.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Source unavailable: request to '{url}' failed: {reason}")]
    Request { url: String, reason: String },

    #[error("Source unavailable: '{url}' returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Source unavailable: failed to stage '{filename}': {source}")]
    Staging {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, PantryError>;
