use thiserror::Error;

use crate::error::SourceError;
use crate::extract::ExtractError;
use crate::history::{HistoryError, ImportAttempt};

/// Why a single file could not be imported.
///
/// The message of each variant is stored as the attempt's error message.
#[derive(Error, Debug)]
pub enum FileError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Import history unavailable: {0}")]
    History(#[from] HistoryError),

    /// The file failed, and writing that failure to history failed too.
    /// `attempt` is the failed snapshot that could not be stored.
    #[error("Failed to record outcome of import attempt {id}: {source}", id = .attempt.id)]
    Unrecorded {
        attempt: Box<ImportAttempt>,
        #[source]
        source: HistoryError,
    },

    #[error("Import task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
