use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use regex::Regex;
use reqwest::{Client, Url};
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::error::SourceError;
use crate::sanitize;

use super::{parse_manifest, RemoteFileSource, StagedFile};

/// Fetches the manifest and listed files over HTTP.
pub struct HttpFileSource {
    client: Client,
    manifest_url: String,
    base_url: Url,
    manifest_timeout: Duration,
    file_timeout: Duration,
    filename_filter: Option<Regex>,
}

impl HttpFileSource {
    pub fn new(config: &SourceConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| SourceError::Client(e.to_string()))?;

        let filename_filter = config
            .filename_pattern
            .as_deref()
            .map(Regex::new)
            .transpose()
            .map_err(|e| SourceError::Client(format!("Invalid filename pattern: {}", e)))?;

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            SourceError::Client(format!(
                "Invalid base URL '{}': {}",
                sanitize::redact_url(&config.base_url),
                e
            ))
        })?;

        Ok(Self {
            client,
            manifest_url: config.manifest_url.clone(),
            base_url,
            manifest_timeout: Duration::from_secs(config.manifest_timeout_secs),
            file_timeout: Duration::from_secs(config.file_timeout_secs),
            filename_filter,
        })
    }

    /// Full URL of a manifest-listed file. The filename is percent-encoded
    /// as one path segment below the base URL.
    pub fn file_url(&self, filename: &str) -> Result<Url, SourceError> {
        let invalid = |reason: &str| SourceError::Request {
            url: sanitize::redact_url(self.base_url.as_str()),
            reason: format!("cannot fetch '{}': {}", filename, reason),
        };
        if filename.is_empty() || filename == "." || filename == ".." {
            return Err(invalid("not a file name"));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| invalid("base URL cannot have a path"))?
            .pop_if_empty()
            .push(filename);
        Ok(url)
    }

    async fn get(&self, url: &str, timeout: Duration) -> Result<reqwest::Response, SourceError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| SourceError::Request {
                url: sanitize::redact_url(url),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                url: sanitize::redact_url(url),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteFileSource for HttpFileSource {
    async fn fetch_manifest(&self) -> Result<Vec<String>, SourceError> {
        let response = self.get(&self.manifest_url, self.manifest_timeout).await?;
        let body = response.text().await.map_err(|e| SourceError::Request {
            url: sanitize::redact_url(&self.manifest_url),
            reason: e.to_string(),
        })?;

        let filenames = parse_manifest(&body, self.filename_filter.as_ref());
        info!(files = filenames.len(), "Fetched import manifest");
        Ok(filenames)
    }

    async fn fetch_file(&self, filename: &str) -> Result<StagedFile, SourceError> {
        let url = self.file_url(filename)?;
        let response = self.get(url.as_str(), self.file_timeout).await?;

        let staging_error = |source: std::io::Error| SourceError::Staging {
            filename: filename.to_string(),
            source,
        };

        let mut staged = StagedFile::create(filename).map_err(staging_error)?;
        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk.map_err(|e| SourceError::Request {
                url: sanitize::redact_url(url.as_str()),
                reason: e.to_string(),
            })?;
            staged.append(&chunk).map_err(staging_error)?;
        }
        staged.finish().map_err(staging_error)?;

        debug!(
            filename = %filename,
            bytes = staged.size(),
            compression = ?staged.compression(),
            "Staged remote file"
        );
        Ok(staged)
    }
}
