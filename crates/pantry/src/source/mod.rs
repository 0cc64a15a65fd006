//! Remote file source: the manifest of filenames and per-file staging.

pub mod http;
pub mod staged;

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::error::SourceError;

pub use http::HttpFileSource;
pub use staged::{Compression, StagedFile};

/// Where batch input comes from.
///
/// Both operations are network-bound and must enforce their own timeouts.
#[async_trait]
pub trait RemoteFileSource: Send + Sync {
    /// Returns the filenames to import in this run.
    async fn fetch_manifest(&self) -> Result<Vec<String>, SourceError>;

    /// Downloads one listed file into scratch storage.
    async fn fetch_file(&self, filename: &str) -> Result<StagedFile, SourceError>;
}

/// Splits a newline-separated manifest into filenames.
///
/// Lines are trimmed and blank lines dropped. When a filter is given, only
/// matching names are kept.
pub fn parse_manifest(body: &str, filter: Option<&Regex>) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| match filter {
            Some(re) if !re.is_match(line) => {
                debug!(filename = %line, "Skipping filename not matching pattern");
                false
            }
            _ => true,
        })
        .map(str::to_string)
        .collect()
}
