//! Process-wide log setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingConfig;
use crate::error::{PantryError, Result};

/// Builds the filter: `RUST_LOG` when set, else the configured directive.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            PantryError::Logging(format!("invalid log level '{}': {}", config.level, e))
        }),
    }
}

/// Installs the global subscriber and routes `log` records into it.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let fmt_layer = if config.json {
        fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    let subscriber = tracing_subscriber::registry().with(filter).with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| PantryError::Logging(e.to_string()))?;

    tracing_log::LogTracer::init().map_err(|e| PantryError::Logging(e.to_string()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_build_filter_from_config() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig {
            level: "pantry=debug,warn".to_string(),
            json: false,
        };
        let filter = build_filter(&config).unwrap();
        assert!(filter.to_string().contains("pantry=debug"));
    }

    #[test]
    #[serial]
    fn test_build_filter_rejects_garbage() {
        std::env::remove_var("RUST_LOG");
        let config = LoggingConfig {
            level: "pantry=loudest".to_string(),
            json: false,
        };
        assert!(matches!(build_filter(&config), Err(PantryError::Logging(_))));
    }
}
