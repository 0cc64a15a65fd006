use std::sync::Arc;

use chrono::Utc;
use tokio::task::JoinError;
use tracing::{debug, error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

use crate::alert::{AlertDispatcher, AlertFanout};
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::extract::{ExtractBudget, ExtractError, RecordExtractor};
use crate::history::{ImportAttempt, ImportHistoryTracker, ImportStatus};
use crate::record::{extract_code, ProductRecord};
use crate::search::{ElasticsearchIndexer, NoopIndexer, SearchIndexer};
use crate::source::{HttpFileSource, RemoteFileSource, StagedFile};
use crate::store::{RecordStore, SqliteRecordStore};

use super::config::ImportConfig;
use super::error::FileError;
use super::outcome::{FileOutcome, ImportedFile};
use super::summary::BatchResult;

async fn run_blocking<T, E, F>(f: F) -> std::result::Result<T, E>
where
    F: FnOnce() -> std::result::Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: From<JoinError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Streams one staged file through the extractor into the store.
///
/// Runs on a blocking thread. The staged file is dropped, and its scratch
/// storage released, when this returns.
fn ingest_staged(
    staged: StagedFile,
    store: &dyn RecordStore,
    budget: ExtractBudget,
) -> FileOutcome {
    let reader = match staged.open() {
        Ok(reader) => reader,
        Err(e) => return FileOutcome::Aborted(ExtractError::SourceUnavailable(e).into()),
    };

    debug!(
        filename = %staged.filename(),
        size = staged.size(),
        compression = ?staged.compression(),
        "Reading staged file"
    );
    let mut imported = ImportedFile::default();

    for item in RecordExtractor::new(reader, budget) {
        let raw = match item {
            Ok(raw) => raw,
            Err(e) => return FileOutcome::Aborted(e.into()),
        };

        match ProductRecord::from_raw(&raw, Utc::now()) {
            Ok(record) => match store.upsert(&record) {
                Ok(()) => {
                    imported.counters.record_imported();
                    imported.records.push(record);
                }
                Err(e) => {
                    imported.counters.record_failed();
                    warn!(code = %record.code, error = %e, "Failed to store product");
                }
            },
            Err(e) => {
                imported.counters.record_failed();
                warn!(
                    code = extract_code(&raw).as_deref().unwrap_or("unknown"),
                    error = %e,
                    "Failed to import product"
                );
            }
        }
    }

    FileOutcome::Imported(imported)
}

/// Writes the final state of an attempt.
///
/// If recording completion fails, the attempt is failed instead so it
/// never stays `processing`. If the failure cannot be written either, the
/// unsaved failed snapshot comes back in [`FileError::Unrecorded`].
fn finalize(
    tracker: &ImportHistoryTracker,
    mut attempt: ImportAttempt,
    outcome: FileOutcome,
) -> std::result::Result<(ImportAttempt, Vec<ProductRecord>), FileError> {
    match outcome {
        FileOutcome::Imported(file) => match tracker.complete(&mut attempt, file.counters) {
            Ok(()) => Ok((attempt, file.records)),
            Err(e) => {
                error!(id = %attempt.id, error = %e, "Failed to record import completion");
                record_failure(tracker, attempt, format!("Failed to record completion: {}", e))
            }
        },
        FileOutcome::Aborted(e) => record_failure(tracker, attempt, e.to_string()),
    }
}

fn record_failure(
    tracker: &ImportHistoryTracker,
    mut attempt: ImportAttempt,
    message: String,
) -> std::result::Result<(ImportAttempt, Vec<ProductRecord>), FileError> {
    match tracker.fail(&mut attempt, message.as_str()) {
        Ok(()) => Ok((attempt, Vec::new())),
        Err(source) => Err(FileError::Unrecorded {
            attempt: Box::new(attempt.as_failed(message)),
            source,
        }),
    }
}

/// Drives one batch run: manifest, then each listed file in turn.
///
/// File and record failures never escape [`run_batch`](Self::run_batch);
/// they end up in the returned counters, the history table and alerts.
pub struct ImportOrchestrator {
    config: Arc<ImportConfig>,
    source: Arc<dyn RemoteFileSource>,
    store: Arc<dyn RecordStore>,
    history: ImportHistoryTracker,
    indexer: Arc<dyn SearchIndexer>,
    alerts: Arc<dyn AlertDispatcher>,
}

impl ImportOrchestrator {
    /// Builds every collaborator from config.
    pub fn from_config(config: &Config, db: Database) -> Result<Self> {
        let source = HttpFileSource::new(&config.source)?;
        let indexer: Arc<dyn SearchIndexer> = if config.search.enabled {
            Arc::new(ElasticsearchIndexer::new(&config.search)?)
        } else {
            Arc::new(NoopIndexer)
        };
        let alerts = AlertFanout::from_config(&config.alerts)?;

        Ok(Self::new(
            Arc::new(ImportConfig::from(config)),
            Arc::new(source),
            Arc::new(SqliteRecordStore::new(db.clone())),
            ImportHistoryTracker::new(db),
            indexer,
            Arc::new(alerts),
        ))
    }

    /// Injects specific collaborators.
    pub fn new(
        config: Arc<ImportConfig>,
        source: Arc<dyn RemoteFileSource>,
        store: Arc<dyn RecordStore>,
        history: ImportHistoryTracker,
        indexer: Arc<dyn SearchIndexer>,
        alerts: Arc<dyn AlertDispatcher>,
    ) -> Self {
        Self {
            config,
            source,
            store,
            history,
            indexer,
            alerts,
        }
    }

    /// Runs one batch. Only a manifest failure (or a failed store count
    /// task) returns `Err`; no history entry exists in that case.
    pub async fn run_batch(&self) -> Result<BatchResult> {
        let span = info_span!("import_batch", run_id = %Uuid::new_v4());
        async {
            let filenames = self.source.fetch_manifest().await.map_err(|e| {
                error!(error = %e, "Import process failed");
                e
            })?;

            let mut result = BatchResult {
                total_files: filenames.len() as u64,
                ..BatchResult::default()
            };

            for filename in &filenames {
                match self.import_file(filename).await {
                    Ok(attempt) if attempt.status == ImportStatus::Completed => {
                        result.processed_files += 1;
                    }
                    Ok(attempt) => {
                        result.failed_files += 1;
                        error!(
                            filename = %filename,
                            error = attempt.error_message.as_deref().unwrap_or(""),
                            "Failed to import file"
                        );
                    }
                    Err(e) => {
                        result.failed_files += 1;
                        error!(filename = %filename, error = %e, "Failed to import file");
                    }
                }
            }

            let store = Arc::clone(&self.store);
            match tokio::task::spawn_blocking(move || store.count()).await? {
                Ok(count) => result.total_products = count,
                Err(e) => warn!(error = %e, "Failed to count stored products"),
            }

            if result.has_failures() {
                self.alerts.notify_batch_summary(&result).await;
            }

            info!(
                total_files = result.total_files,
                processed_files = result.processed_files,
                failed_files = result.failed_files,
                total_products = result.total_products,
                "Import batch finished"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Imports one manifest entry and returns its finalized attempt.
    ///
    /// `Err` means the history entry itself could not be written. A file
    /// whose failure could not be recorded is still alerted on before
    /// [`FileError::Unrecorded`] is returned.
    pub async fn import_file(
        &self,
        filename: &str,
    ) -> std::result::Result<ImportAttempt, FileError> {
        let span = info_span!("import_file", filename = %filename);
        async {
            let tracker = self.history.clone();
            let name = filename.to_string();
            let attempt = run_blocking(move || Ok::<_, FileError>(tracker.open(&name)?)).await?;

            let outcome = match self.source.fetch_file(filename).await {
                Ok(staged) => self.ingest(staged).await,
                Err(e) => FileOutcome::Aborted(e.into()),
            };

            let tracker = self.history.clone();
            let (attempt, imported) =
                match run_blocking(move || finalize(&tracker, attempt, outcome)).await {
                    Ok(finalized) => finalized,
                    Err(FileError::Unrecorded { attempt, source }) => {
                        error!(
                            id = %attempt.id,
                            error = %source,
                            "Import attempt left in processing"
                        );
                        self.alerts.notify_file_failure(&attempt).await;
                        return Err(FileError::Unrecorded { attempt, source });
                    }
                    Err(e) => return Err(e),
                };

            match attempt.status {
                ImportStatus::Completed => {
                    info!(
                        total = attempt.counters.total,
                        imported = attempt.counters.imported,
                        failed = attempt.counters.failed,
                        "File imported"
                    );
                    if !imported.is_empty() && !self.indexer.bulk_index(&imported).await {
                        warn!(count = imported.len(), "Search indexing failed for file");
                    }
                }
                _ => {
                    self.alerts.notify_file_failure(&attempt).await;
                }
            }

            Ok(attempt)
        }
        .instrument(span)
        .await
    }

    async fn ingest(&self, staged: StagedFile) -> FileOutcome {
        let store = Arc::clone(&self.store);
        let budget = self.config.budget;
        let span = Span::current();

        let task = tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            ingest_staged(staged, store.as_ref(), budget)
        });
        match task.await {
            Ok(outcome) => outcome,
            Err(e) => FileOutcome::Aborted(e.into()),
        }
    }
}
