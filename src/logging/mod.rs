// Logging module for structured logging using the tracing crate

use serde::{Deserialize, Serialize};
use std::error::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output encoding for log events
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line, for log aggregation systems
    #[default]
    Json,
    /// Human-readable output for local development
    Pretty,
}

fn default_level() -> String {
    "info".to_string()
}

/// `logging` section of the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
    /// Filter directive used when `RUST_LOG` is not set (default: "info")
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: default_level(),
        }
    }
}

/// Build the event filter: `RUST_LOG` wins over the configured level.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter, Box<dyn Error + Send + Sync>> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.level)?),
    }
}

/// Initialize the tracing subscriber for structured logging
///
/// The subscriber is configured with:
/// - JSON or pretty formatting according to `config.format`
/// - Filtering from `RUST_LOG`, falling back to `config.level`
/// - Output to stdout for container/cloud-native deployments
///
/// # Errors
///
/// Returns an error if the filter directive is invalid or a global
/// subscriber has already been installed.
///
/// # Examples
///
/// ```no_run
/// use tsubame::logging::{init_subscriber, LoggingConfig};
///
/// init_subscriber(&LoggingConfig::default()).expect("Failed to initialize logging");
/// tracing::info!("Application started");
/// ```
pub fn init_subscriber(config: &LoggingConfig) -> Result<(), Box<dyn Error + Send + Sync>> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.format {
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(false)
                    .with_target(true),
            )
            .try_init()?,
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_target(false))
            .try_init()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_defaults() {
        let config: LoggingConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_logging_config_pretty() {
        let config: LoggingConfig =
            serde_yaml::from_str("format: pretty\nlevel: \"tsubame=debug\"").unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.level, "tsubame=debug");
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(serde_yaml::from_str::<LoggingConfig>("format: xml").is_err());
    }

    #[test]
    fn test_build_filter_accepts_directives() {
        let config = LoggingConfig {
            format: LogFormat::Json,
            level: "warn,tsubame=debug".to_string(),
        };
        assert!(build_filter(&config).is_ok());
    }
}
