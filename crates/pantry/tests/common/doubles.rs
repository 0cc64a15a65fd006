//! In-process stand-ins for the search cluster and alert channels.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;

use pantry::alert::AlertDispatcher;
use pantry::history::ImportAttempt;
use pantry::import::BatchResult;
use pantry::record::ProductRecord;
use pantry::search::{HealthStatus, SearchIndexer, SearchResults};

/// Captures every alert it is asked to send.
#[derive(Default)]
pub struct RecordingAlerts {
    pub file_failures: Mutex<Vec<ImportAttempt>>,
    pub batch_summaries: Mutex<Vec<BatchResult>>,
}

impl RecordingAlerts {
    pub fn file_failures(&self) -> Vec<ImportAttempt> {
        self.file_failures.lock().unwrap().clone()
    }

    pub fn batch_summaries(&self) -> Vec<BatchResult> {
        self.batch_summaries.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertDispatcher for RecordingAlerts {
    async fn notify_file_failure(&self, attempt: &ImportAttempt) {
        self.file_failures.lock().unwrap().push(attempt.clone());
    }

    async fn notify_batch_summary(&self, result: &BatchResult) {
        self.batch_summaries.lock().unwrap().push(*result);
    }
}

/// Records bulk requests; can be told to reject them.
#[derive(Default)]
pub struct RecordingIndexer {
    pub reject: bool,
    pub bulks: Mutex<Vec<Vec<String>>>,
}

impl RecordingIndexer {
    pub fn rejecting() -> Self {
        Self {
            reject: true,
            ..Self::default()
        }
    }

    /// Codes sent in each bulk request, in order.
    pub fn bulks(&self) -> Vec<Vec<String>> {
        self.bulks.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchIndexer for RecordingIndexer {
    async fn ensure_index(&self) -> bool {
        !self.reject
    }

    async fn index_one(&self, record: &ProductRecord) -> bool {
        self.bulk_index(std::slice::from_ref(record)).await
    }

    async fn bulk_index(&self, records: &[ProductRecord]) -> bool {
        self.bulks
            .lock()
            .unwrap()
            .push(records.iter().map(|r| r.code.clone()).collect());
        !self.reject
    }

    async fn delete(&self, _code: &str) -> bool {
        !self.reject
    }

    async fn search(&self, _query: &str, _from: u64, _size: u64) -> SearchResults {
        SearchResults::empty()
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus {
            available: !self.reject,
            status: "green".to_string(),
        }
    }
}
