use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

use crate::db::history_repo::{self, ImportHistoryRow};
use crate::db::{Database, DatabaseError};

use super::{HistoryError, ImportAttempt, ImportStatus, RecordCounters};

fn timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(
    column: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(&v)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| DatabaseError::Corrupt {
                    column: column.to_string(),
                    reason: e.to_string(),
                })
        })
        .transpose()
}

impl TryFrom<ImportHistoryRow> for ImportAttempt {
    type Error = DatabaseError;

    fn try_from(row: ImportHistoryRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<ImportStatus>()
            .map_err(|reason| DatabaseError::Corrupt {
                column: "status".to_string(),
                reason,
            })?;

        Ok(Self {
            id: row.id,
            filename: row.filename,
            status,
            counters: RecordCounters {
                total: row.total_records,
                imported: row.imported_records,
                failed: row.failed_records,
            },
            started_at: parse_timestamp("started_at", row.started_at)?,
            finished_at: parse_timestamp("finished_at", row.finished_at)?,
            error_message: row.error_message,
        })
    }
}

fn to_row(attempt: &ImportAttempt, created_at: &str, updated_at: &str) -> ImportHistoryRow {
    ImportHistoryRow {
        id: attempt.id.clone(),
        filename: attempt.filename.clone(),
        status: attempt.status.as_str().to_string(),
        total_records: attempt.counters.total,
        imported_records: attempt.counters.imported,
        failed_records: attempt.counters.failed,
        started_at: attempt.started_at.map(timestamp),
        finished_at: attempt.finished_at.map(timestamp),
        error_message: attempt.error_message.clone(),
        created_at: created_at.to_string(),
        updated_at: updated_at.to_string(),
    }
}

/// Owns every state transition of persisted import attempts.
///
/// The only legal finalizations are `processing -> completed` and
/// `processing -> failed`. The in-memory snapshot is updated only after the
/// row has been written.
#[derive(Clone)]
pub struct ImportHistoryTracker {
    db: Database,
}

impl ImportHistoryTracker {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a `pending` attempt for `filename` and moves it to `processing`.
    /// Both writes share a transaction, so a failed open leaves no row.
    pub fn open(&self, filename: &str) -> Result<ImportAttempt, HistoryError> {
        let now = Utc::now();
        let created = timestamp(now);
        let mut attempt = ImportAttempt {
            id: Uuid::new_v4().to_string(),
            filename: filename.to_string(),
            status: ImportStatus::Pending,
            counters: RecordCounters::default(),
            started_at: None,
            finished_at: None,
            error_message: None,
        };
        let pending = to_row(&attempt, &created, &created);

        attempt.status = ImportStatus::Processing;
        attempt.started_at = Some(now);
        history_repo::insert_then_update(
            &self.db,
            &pending,
            &to_row(&attempt, &created, &created),
        )?;

        tracing::debug!(id = %attempt.id, filename = %filename, "Import attempt opened");
        Ok(attempt)
    }

    /// Finalizes the attempt as `completed` with its record counters.
    pub fn complete(
        &self,
        attempt: &mut ImportAttempt,
        counters: RecordCounters,
    ) -> Result<(), HistoryError> {
        Self::ensure_processing(attempt)?;
        if !counters.is_consistent() {
            return Err(HistoryError::InconsistentCounters {
                total: counters.total,
                imported: counters.imported,
                failed: counters.failed,
            });
        }

        let mut next = attempt.clone();
        next.status = ImportStatus::Completed;
        next.counters = counters;
        next.finished_at = Some(Utc::now());
        self.write(&next)?;

        *attempt = next;
        Ok(())
    }

    /// Finalizes the attempt as `failed`. Counters are left untouched.
    pub fn fail(
        &self,
        attempt: &mut ImportAttempt,
        message: impl Into<String>,
    ) -> Result<(), HistoryError> {
        Self::ensure_processing(attempt)?;

        let next = attempt.as_failed(message);
        self.write(&next)?;

        *attempt = next;
        Ok(())
    }

    pub fn find(&self, id: &str) -> Result<ImportAttempt, HistoryError> {
        let row = history_repo::find_by_id(&self.db, id)?
            .ok_or_else(|| HistoryError::NotFound(id.to_string()))?;
        Ok(ImportAttempt::try_from(row)?)
    }

    /// Most recent attempts first.
    pub fn recent(&self, limit: u64) -> Result<Vec<ImportAttempt>, HistoryError> {
        let rows = history_repo::recent(&self.db, limit)?;
        let attempts = rows
            .into_iter()
            .map(ImportAttempt::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(attempts)
    }

    pub fn count_by_status(&self, status: ImportStatus) -> Result<u64, HistoryError> {
        Ok(history_repo::count_by_status(&self.db, status.as_str())?)
    }

    fn ensure_processing(attempt: &ImportAttempt) -> Result<(), HistoryError> {
        if attempt.status != ImportStatus::Processing {
            return Err(HistoryError::AlreadyFinalized {
                id: attempt.id.clone(),
                status: attempt.status,
            });
        }
        Ok(())
    }

    fn write(&self, attempt: &ImportAttempt) -> Result<(), HistoryError> {
        let existing = history_repo::find_by_id(&self.db, &attempt.id)?
            .ok_or_else(|| HistoryError::NotFound(attempt.id.clone()))?;
        let now = timestamp(Utc::now());
        history_repo::update(&self.db, &to_row(attempt, &existing.created_at, &now))?;
        Ok(())
    }
}
