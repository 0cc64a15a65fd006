use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::config::SlackConfig;
use crate::history::ImportAttempt;
use crate::import::BatchResult;

use super::{AlertDispatcher, AlertError};

fn display_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn field(label: &str, value: impl std::fmt::Display) -> Value {
    json!({ "type": "mrkdwn", "text": format!("*{}:*\n{}", label, value) })
}

/// Block-kit message for a failed file import.
pub fn file_failure_payload(attempt: &ImportAttempt) -> Value {
    let error_message = attempt.error_message.as_deref().unwrap_or("");
    json!({
        "text": ":warning: *Import Failure Alert*",
        "blocks": [
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": format!(
                        "*Import Failed*\n\nFile: `{}`\nStatus: `{}`",
                        attempt.filename, attempt.status
                    )
                }
            },
            {
                "type": "section",
                "fields": [
                    field("Started", display_time(attempt.started_at)),
                    field("Finished", display_time(attempt.finished_at)),
                    field("Total Records", attempt.counters.total),
                    field("Failed", attempt.counters.failed)
                ]
            },
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": format!("*Error:*\n```{}```", error_message)
                }
            }
        ]
    })
}

/// Block-kit message for a batch that finished with failed files.
pub fn batch_summary_payload(result: &BatchResult) -> Value {
    json!({
        "text": ":warning: *Import batch completed with failures*",
        "blocks": [
            {
                "type": "section",
                "fields": [
                    field("Total Files", result.total_files),
                    field("Processed Files", result.processed_files),
                    field("Failed Files", result.failed_files),
                    field("Total Products", result.total_products)
                ]
            }
        ]
    })
}

/// Posts alerts to a Slack incoming webhook.
pub struct SlackAlerts {
    client: Client,
    webhook: SecretString,
}

impl SlackAlerts {
    pub fn new(webhook: SecretString, timeout: Duration) -> Result<Self, AlertError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AlertError::Client(e.to_string()))?;
        Ok(Self { client, webhook })
    }

    pub fn from_config(config: &SlackConfig) -> Result<Self, AlertError> {
        let webhook = config.webhook.resolve()?;
        Self::new(webhook, Duration::from_secs(config.timeout_secs))
    }

    async fn post(&self, kind: &str, payload: &Value) {
        let result = self
            .client
            .post(self.webhook.expose_secret())
            .json(payload)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(kind = %kind, "Slack alert delivered");
            }
            Ok(response) => {
                error!(
                    kind = %kind,
                    status = response.status().as_u16(),
                    "Slack webhook rejected alert"
                );
            }
            Err(e) => {
                // reqwest errors embed the request URL, which is the secret here.
                error!(kind = %kind, error = %e.without_url(), "Failed to send Slack alert");
            }
        }
    }
}

#[async_trait]
impl AlertDispatcher for SlackAlerts {
    async fn notify_file_failure(&self, attempt: &ImportAttempt) {
        self.post("file_failure", &file_failure_payload(attempt)).await;
    }

    async fn notify_batch_summary(&self, result: &BatchResult) {
        self.post("batch_summary", &batch_summary_payload(result)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{ImportStatus, RecordCounters};
    use chrono::TimeZone;

    #[test]
    fn test_file_failure_payload() {
        let attempt = ImportAttempt {
            id: "x".to_string(),
            filename: "products_07.json.gz".to_string(),
            status: ImportStatus::Failed,
            counters: RecordCounters::default(),
            started_at: Some(Utc.with_ymd_and_hms(2026, 5, 4, 3, 0, 0).unwrap()),
            finished_at: None,
            error_message: Some("No valid records found in file".to_string()),
        };

        let payload = file_failure_payload(&attempt);
        let blocks = payload["blocks"].as_array().unwrap();
        assert_eq!(blocks.len(), 3);

        let header = blocks[0]["text"]["text"].as_str().unwrap();
        assert!(header.contains("`products_07.json.gz`"));
        assert!(header.contains("`failed`"));

        let fields = blocks[1]["fields"].as_array().unwrap();
        assert_eq!(fields[0]["text"], "*Started:*\n2026-05-04 03:00:00");
        assert_eq!(fields[1]["text"], "*Finished:*\n-");

        let error = blocks[2]["text"]["text"].as_str().unwrap();
        assert!(error.contains("No valid records found in file"));
    }

    #[test]
    fn test_batch_summary_payload() {
        let payload = batch_summary_payload(&BatchResult {
            total_files: 9,
            processed_files: 7,
            failed_files: 2,
            total_products: 700,
        });
        let fields = payload["blocks"][0]["fields"].as_array().unwrap();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[2]["text"], "*Failed Files:*\n2");
    }
}
