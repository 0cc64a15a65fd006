use std::path::Path;

use regex::Regex;
use reqwest::Url;

use crate::config::schema::{Config, CONFIG_VERSION};
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Loads the file when a path is given, otherwise validated defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            validate_config(&config)?;
            Ok(config)
        }
    }
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field: field.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            field: field.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(())
}

fn require_positive(field: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation {
            message: format!("{} must be greater than zero", field),
        });
    }
    Ok(())
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != CONFIG_VERSION {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    validate_url("source.manifest_url", &config.source.manifest_url)?;
    validate_url("source.base_url", &config.source.base_url)?;
    if let Some(pattern) = &config.source.filename_pattern {
        Regex::new(pattern).map_err(|e| ConfigError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;
    }

    require_positive("source.manifest_timeout_secs", config.source.manifest_timeout_secs)?;
    require_positive("source.file_timeout_secs", config.source.file_timeout_secs)?;
    require_positive("source.connect_timeout_secs", config.source.connect_timeout_secs)?;

    require_positive("extract.max_bytes", config.extract.max_bytes)?;
    require_positive("extract.max_records", config.extract.max_records as u64)?;
    require_positive("extract.chunk_size", config.extract.chunk_size as u64)?;

    if config.search.enabled {
        validate_url("search.url", &config.search.url)?;
        if config.search.index.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "search.index must not be empty".to_string(),
            });
        }
    }
    require_positive("search.health_timeout_secs", config.search.health_timeout_secs)?;
    require_positive("search.request_timeout_secs", config.search.request_timeout_secs)?;
    if config.search.health_timeout_secs >= config.source.file_timeout_secs {
        return Err(ConfigError::Validation {
            message: format!(
                "search.health_timeout_secs ({}) must be shorter than source.file_timeout_secs ({})",
                config.search.health_timeout_secs, config.source.file_timeout_secs
            ),
        });
    }

    if let Some(slack) = &config.alerts.slack {
        if slack.enabled && !slack.webhook.is_configured() {
            return Err(ConfigError::Validation {
                message: "alerts.slack.webhook needs one of value, file or envVar".to_string(),
            });
        }
    }

    Ok(())
}
