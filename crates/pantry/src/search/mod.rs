//! Search index republishing.
//!
//! The canonical store is the source of truth; the index is a best-effort
//! copy. Every [`SearchIndexer`] operation reduces its failures to a
//! boolean or an empty result so callers never have to handle them.

mod elasticsearch;
mod reindex;
mod types;

use async_trait::async_trait;
use thiserror::Error;

use crate::record::ProductRecord;

pub use elasticsearch::{bulk_body, ElasticsearchIndexer};
pub use reindex::{reindex_all, ReindexSummary, REINDEX_CHUNK_SIZE};
pub use types::{HealthStatus, SearchDocument, SearchHit, SearchResults};

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Failed to build search client: {0}")]
    Client(String),

    #[error("{operation} request failed: {reason}")]
    Request {
        operation: &'static str,
        reason: String,
    },

    #[error("{operation} returned status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {operation} response: {reason}")]
    Decode {
        operation: &'static str,
        reason: String,
    },

    #[error("Bulk request reported errors for some items")]
    BulkItems,

    #[error("'{0}' cannot be used as a document id")]
    InvalidDocumentId(String),
}

/// Publishes products to a full-text search index.
#[async_trait]
pub trait SearchIndexer: Send + Sync {
    /// Creates the index with its mapping. Succeeds if it already exists.
    async fn ensure_index(&self) -> bool;

    async fn index_one(&self, record: &ProductRecord) -> bool;

    /// Submits all records in one request. An empty slice is a no-op.
    async fn bulk_index(&self, records: &[ProductRecord]) -> bool;

    /// Removes a document. A missing document counts as removed.
    async fn delete(&self, code: &str) -> bool;

    async fn search(&self, query: &str, from: u64, size: u64) -> SearchResults;

    async fn health_check(&self) -> HealthStatus;
}

/// Indexer used when search is disabled. Accepts everything, finds nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndexer;

#[async_trait]
impl SearchIndexer for NoopIndexer {
    async fn ensure_index(&self) -> bool {
        true
    }

    async fn index_one(&self, _record: &ProductRecord) -> bool {
        true
    }

    async fn bulk_index(&self, _records: &[ProductRecord]) -> bool {
        true
    }

    async fn delete(&self, _code: &str) -> bool {
        true
    }

    async fn search(&self, _query: &str, _from: u64, _size: u64) -> SearchResults {
        SearchResults::empty()
    }

    async fn health_check(&self) -> HealthStatus {
        HealthStatus {
            available: false,
            status: "disabled".to_string(),
        }
    }
}
