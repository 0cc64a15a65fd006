use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::extract::ExtractBudget;
use crate::secrets::SecretRef;

pub const CONFIG_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub alerts: AlertsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            source: SourceConfig::default(),
            extract: ExtractConfig::default(),
            database: DatabaseConfig::default(),
            search: SearchConfig::default(),
            alerts: AlertsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Where the manifest and the files it lists are fetched from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_manifest_timeout")]
    pub manifest_timeout_secs: u64,
    #[serde(default = "default_file_timeout")]
    pub file_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// Only manifest entries matching this regex are imported.
    #[serde(default)]
    pub filename_pattern: Option<String>,
}

fn default_manifest_url() -> String {
    "https://challenges.coode.sh/food/data/json/index.txt".to_string()
}

fn default_base_url() -> String {
    "https://challenges.coode.sh/food/data/json/".to_string()
}

fn default_manifest_timeout() -> u64 {
    30
}

fn default_file_timeout() -> u64 {
    120
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            manifest_url: default_manifest_url(),
            base_url: default_base_url(),
            manifest_timeout_secs: default_manifest_timeout(),
            file_timeout_secs: default_file_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            filename_pattern: None,
        }
    }
}

/// Per-file extraction budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_max_bytes")]
    pub max_bytes: u64,
    #[serde(default = "default_max_records")]
    pub max_records: usize,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_max_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_max_records() -> usize {
    100
}

fn default_chunk_size() -> usize {
    8192
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            max_records: default_max_records(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl ExtractConfig {
    pub fn budget(&self) -> ExtractBudget {
        ExtractBudget {
            max_bytes: self.max_bytes,
            max_records: self.max_records,
            chunk_size: self.chunk_size,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Defaults to `~/.pantry/data/pantry.db`.
    #[serde(default)]
    pub path: Option<String>,
}

impl DatabaseConfig {
    /// Resolves the configured path, expanding a leading `~`.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        match self.path.as_deref() {
            Some(p) if p == "~" || p.starts_with("~/") => {
                let rest = p.trim_start_matches('~').trim_start_matches('/');
                dirs::home_dir().map(|home| home.join(rest))
            }
            Some(p) => Some(PathBuf::from(p)),
            None => crate::db::default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_search_url")]
    pub url: String,
    #[serde(default = "default_index")]
    pub index: String,
    #[serde(default = "default_health_timeout")]
    pub health_timeout_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_search_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_index() -> String {
    "products".to_string()
}

fn default_health_timeout() -> u64 {
    3
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_search_url(),
            index: default_index(),
            health_timeout_secs: default_health_timeout(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertsConfig {
    #[serde(default)]
    pub slack: Option<SlackConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    pub webhook: SecretRef,
    #[serde(default = "default_slack_timeout")]
    pub timeout_secs: u64,
}

fn default_slack_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.source.manifest_timeout_secs, 30);
        assert_eq!(config.source.file_timeout_secs, 120);
        assert_eq!(config.extract.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.extract.max_records, 100);
        assert_eq!(config.extract.chunk_size, 8192);
        assert_eq!(config.search.url, "http://localhost:9200");
        assert_eq!(config.search.index, "products");
        assert_eq!(config.search.health_timeout_secs, 3);
        assert!(config.search.enabled);
        assert!(config.alerts.slack.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_extract_budget() {
        let extract = ExtractConfig {
            max_bytes: 1024,
            max_records: 5,
            chunk_size: 64,
        };
        let budget = extract.budget();
        assert_eq!(budget.max_bytes, 1024);
        assert_eq!(budget.max_records, 5);
        assert_eq!(budget.chunk_size, 64);
    }

    #[test]
    fn test_database_path_resolution() {
        let explicit = DatabaseConfig {
            path: Some("/var/lib/pantry/pantry.db".to_string()),
        };
        assert_eq!(
            explicit.resolve_path(),
            Some(PathBuf::from("/var/lib/pantry/pantry.db"))
        );

        if let Some(home) = dirs::home_dir() {
            let tilde = DatabaseConfig {
                path: Some("~/data/p.db".to_string()),
            };
            assert_eq!(tilde.resolve_path(), Some(home.join("data/p.db")));

            let default = DatabaseConfig::default();
            assert_eq!(
                default.resolve_path(),
                Some(home.join(".pantry").join("data").join("pantry.db"))
            );
        }
    }
}
