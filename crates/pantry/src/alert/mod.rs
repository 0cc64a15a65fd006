//! Operator alerts for failed imports.
//!
//! Dispatchers never fail towards the caller. Delivery problems are logged
//! by the dispatcher itself.

mod log;
mod slack;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::AlertsConfig;
use crate::history::ImportAttempt;
use crate::import::BatchResult;
use crate::secrets::SecretError;

pub use self::log::{LogAlerts, ALERT_TARGET};
pub use slack::{batch_summary_payload, file_failure_payload, SlackAlerts};

#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Failed to resolve webhook: {0}")]
    Secret(#[from] SecretError),

    #[error("Failed to build alert HTTP client: {0}")]
    Client(String),
}

#[async_trait]
pub trait AlertDispatcher: Send + Sync {
    /// Called once for every file whose import attempt ended `failed`.
    async fn notify_file_failure(&self, attempt: &ImportAttempt);

    /// Called at the end of a batch in which at least one file failed.
    async fn notify_batch_summary(&self, result: &BatchResult);
}

/// Sends every alert to each configured channel in turn.
#[derive(Clone, Default)]
pub struct AlertFanout {
    channels: Vec<Arc<dyn AlertDispatcher>>,
}

impl AlertFanout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, channel: Arc<dyn AlertDispatcher>) -> Self {
        self.channels.push(channel);
        self
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Log alerts are always on. A Slack channel is added when configured.
    pub fn from_config(config: &AlertsConfig) -> Result<Self, AlertError> {
        let mut fanout = Self::new().with(Arc::new(LogAlerts));
        if let Some(slack) = &config.slack {
            if slack.enabled {
                fanout = fanout.with(Arc::new(SlackAlerts::from_config(slack)?));
            }
        }
        Ok(fanout)
    }
}

#[async_trait]
impl AlertDispatcher for AlertFanout {
    async fn notify_file_failure(&self, attempt: &ImportAttempt) {
        for channel in &self.channels {
            channel.notify_file_failure(attempt).await;
        }
    }

    async fn notify_batch_summary(&self, result: &BatchResult) {
        for channel in &self.channels {
            channel.notify_batch_summary(result).await;
        }
    }
}
