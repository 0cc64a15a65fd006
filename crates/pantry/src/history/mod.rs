//! Per-file import history.
//!
//! Each file processed in a batch run gets one [`ImportAttempt`]. Its
//! lifecycle is owned by [`ImportHistoryTracker`]:
//!
//! ```text
//! pending -> processing -> completed
//!                       \-> failed
//! ```

mod tracker;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::db::DatabaseError;

pub use tracker::ImportHistoryTracker;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("Import attempt {id} is already {status}")]
    AlreadyFinalized { id: String, status: ImportStatus },

    #[error(
        "Inconsistent counters: imported ({imported}) + failed ({failed}) exceeds total ({total})"
    )]
    InconsistentCounters {
        total: u64,
        imported: u64,
        failed: u64,
    },

    #[error("Import attempt not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Pending => "pending",
            ImportStatus::Processing => "processing",
            ImportStatus::Completed => "completed",
            ImportStatus::Failed => "failed",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, ImportStatus::Completed | ImportStatus::Failed)
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ImportStatus::Pending),
            "processing" => Ok(ImportStatus::Processing),
            "completed" => Ok(ImportStatus::Completed),
            "failed" => Ok(ImportStatus::Failed),
            other => Err(format!("unknown import status '{}'", other)),
        }
    }
}

/// Record counts for one file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RecordCounters {
    pub total: u64,
    pub imported: u64,
    pub failed: u64,
}

impl RecordCounters {
    /// Counts a record that was stored.
    pub fn record_imported(&mut self) {
        self.total += 1;
        self.imported += 1;
    }

    /// Counts a recognized record that could not be stored.
    pub fn record_failed(&mut self) {
        self.total += 1;
        self.failed += 1;
    }

    pub fn is_consistent(&self) -> bool {
        self.imported
            .checked_add(self.failed)
            .is_some_and(|sum| sum <= self.total)
    }
}

/// Snapshot of one file-import attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportAttempt {
    pub id: String,
    pub filename: String,
    pub status: ImportStatus,
    pub counters: RecordCounters,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl ImportAttempt {
    /// This attempt as it reads once failed with `message`.
    pub fn as_failed(&self, message: impl Into<String>) -> Self {
        Self {
            status: ImportStatus::Failed,
            error_message: Some(message.into()),
            finished_at: Some(Utc::now()),
            ..self.clone()
        }
    }
}
