use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::store::RecordStore;

use super::SearchIndexer;

/// Page size used when republishing the whole store.
pub const REINDEX_CHUNK_SIZE: u64 = 100;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReindexSummary {
    pub total: u64,
    pub indexed: u64,
    pub failed_chunks: u64,
}

/// Republishes every stored record, one bulk request per page.
///
/// A rejected page is counted and skipped. Storage errors abort the run.
pub async fn reindex_all(
    store: Arc<dyn RecordStore>,
    indexer: &dyn SearchIndexer,
    chunk_size: u64,
) -> Result<ReindexSummary> {
    let chunk_size = chunk_size.max(1);
    let mut summary = ReindexSummary::default();
    let mut offset = 0;

    loop {
        let page_store = Arc::clone(&store);
        let page =
            tokio::task::spawn_blocking(move || page_store.all_paginated(chunk_size, offset))
                .await??;
        if page.is_empty() {
            break;
        }

        let len = page.len() as u64;
        summary.total += len;
        if indexer.bulk_index(&page).await {
            summary.indexed += len;
        } else {
            summary.failed_chunks += 1;
            warn!(offset, count = len, "Reindex chunk rejected");
        }

        offset += len;
        if len < chunk_size {
            break;
        }
    }

    info!(
        total = summary.total,
        indexed = summary.indexed,
        failed_chunks = summary.failed_chunks,
        "Reindex finished"
    );
    Ok(summary)
}
