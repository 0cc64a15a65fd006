//! Test harness for isolated batch runs.
//!
//! Serves the manifest and data files from a `wiremock` server and keeps
//! all state in an in-memory database.

#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;

use flate2::write::GzEncoder;
use flate2::Compression;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pantry::config::SourceConfig;
use pantry::db::Database;
use pantry::extract::ExtractBudget;
use pantry::history::ImportHistoryTracker;
use pantry::import::{ImportConfig, ImportOrchestrator};
use pantry::source::HttpFileSource;
use pantry::store::{RecordStore, SqliteRecordStore};

use super::{RecordingAlerts, RecordingIndexer};

pub struct TestHarness {
    pub server: MockServer,
    pub db: Database,
    pub store: Arc<SqliteRecordStore>,
    pub history: ImportHistoryTracker,
    pub indexer: Arc<RecordingIndexer>,
    pub alerts: Arc<RecordingAlerts>,
    pub budget: ExtractBudget,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_indexer(RecordingIndexer::default()).await
    }

    pub async fn with_indexer(indexer: RecordingIndexer) -> Self {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        Self {
            server: MockServer::start().await,
            store: Arc::new(SqliteRecordStore::new(db.clone())),
            history: ImportHistoryTracker::new(db.clone()),
            db,
            indexer: Arc::new(indexer),
            alerts: Arc::new(RecordingAlerts::default()),
            budget: ExtractBudget::default(),
        }
    }

    pub fn source_config(&self) -> SourceConfig {
        SourceConfig {
            manifest_url: format!("{}/index.txt", self.server.uri()),
            base_url: format!("{}/", self.server.uri()),
            manifest_timeout_secs: 5,
            file_timeout_secs: 5,
            connect_timeout_secs: 2,
            filename_pattern: None,
        }
    }

    /// Serves `filenames` as the manifest body, one per line.
    pub async fn serve_manifest(&self, filenames: &[&str]) {
        let body = filenames.join("\n");
        Mock::given(method("GET"))
            .and(path("/index.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    pub async fn serve_manifest_status(&self, status: u16) {
        Mock::given(method("GET"))
            .and(path("/index.txt"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub async fn serve_file(&self, filename: &str, body: impl Into<Vec<u8>>) {
        Mock::given(method("GET"))
            .and(path(format!("/{}", filename)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.into()))
            .mount(&self.server)
            .await;
    }

    pub async fn serve_gzip_file(&self, filename: &str, body: &str) {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(body.as_bytes()).unwrap();
        self.serve_file(filename, encoder.finish().unwrap()).await;
    }

    pub async fn serve_file_status(&self, filename: &str, status: u16) {
        Mock::given(method("GET"))
            .and(path(format!("/{}", filename)))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    pub fn orchestrator(&self) -> ImportOrchestrator {
        let source = HttpFileSource::new(&self.source_config()).expect("Failed to build source");
        ImportOrchestrator::new(
            Arc::new(ImportConfig {
                budget: self.budget,
            }),
            Arc::new(source),
            self.store.clone(),
            self.history.clone(),
            self.indexer.clone(),
            self.alerts.clone(),
        )
    }

    pub fn product_count(&self) -> u64 {
        self.store.count().unwrap()
    }
}
