use async_trait::async_trait;
use tracing::{error, warn};

use crate::history::ImportAttempt;
use crate::import::BatchResult;

use super::AlertDispatcher;

/// Log target for alert lines, so they can be routed separately.
pub const ALERT_TARGET: &str = "import_alerts";

/// Writes alerts as structured log events on [`ALERT_TARGET`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlerts;

#[async_trait]
impl AlertDispatcher for LogAlerts {
    async fn notify_file_failure(&self, attempt: &ImportAttempt) {
        error!(
            target: ALERT_TARGET,
            filename = %attempt.filename,
            status = %attempt.status,
            error_message = attempt.error_message.as_deref().unwrap_or(""),
            started_at = ?attempt.started_at,
            finished_at = ?attempt.finished_at,
            total_records = attempt.counters.total,
            imported_records = attempt.counters.imported,
            failed_records = attempt.counters.failed,
            "Import process failed"
        );
    }

    async fn notify_batch_summary(&self, result: &BatchResult) {
        warn!(
            target: ALERT_TARGET,
            total_files = result.total_files,
            processed_files = result.processed_files,
            failed_files = result.failed_files,
            total_products = result.total_products,
            severity = "warning",
            "Import batch completed with failures"
        );
    }
}
