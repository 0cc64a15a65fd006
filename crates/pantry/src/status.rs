//! Health report for the `status` command.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::db::{meta_repo, Database, DatabaseError};
use crate::search::{HealthStatus, SearchIndexer};

const NEVER_EXECUTED: &str = "Never executed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DatabaseHealth {
    pub read: bool,
    pub write: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub database: DatabaseHealth,
    pub search: HealthStatus,
    /// RFC3339 timestamp of the last finished batch, or "Never executed".
    pub last_batch_execution: String,
}

impl StatusReport {
    /// Probes the database and search cluster. Never fails; every probe
    /// reports its own availability.
    pub async fn collect(db: &Database, indexer: &dyn SearchIndexer) -> Self {
        let probe = db.clone();
        let (database, last) = tokio::task::spawn_blocking(move || {
            let health = DatabaseHealth {
                read: probe.check_read(),
                write: probe.check_write(),
            };
            let last = meta_repo::get(&probe, meta_repo::LAST_BATCH_EXECUTION)
                .ok()
                .flatten();
            (health, last)
        })
        .await
        .unwrap_or((
            DatabaseHealth {
                read: false,
                write: false,
            },
            None,
        ));

        Self {
            status: "online",
            database,
            search: indexer.health_check().await,
            last_batch_execution: last.unwrap_or_else(|| NEVER_EXECUTED.to_string()),
        }
    }
}

/// Stamps the current time as the last batch execution.
pub fn record_batch_execution(db: &Database) -> Result<(), DatabaseError> {
    let now = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    meta_repo::set(db, meta_repo::LAST_BATCH_EXECUTION, &now)
}
