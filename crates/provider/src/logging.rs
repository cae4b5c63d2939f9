//! Tracing setup for the provider process.
//!
//! Terraform captures a plugin's stderr and controls verbosity with `TF_LOG`,
//! so logs always go to stderr and `TF_LOG` is honoured when no explicit
//! filter is configured.

use std::io;
use std::sync::OnceLock;

pub use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

const CRATE_TARGETS: [&str; 2] = ["circonus_provider", "circonus_api"];

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line human-readable output
    Pretty,
    /// Single-line output
    Compact,
    /// One JSON object per event
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown log format: {s}")),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Output format
    pub format: LogFormat,
    /// Level used when neither `filter` nor the environment says otherwise
    pub level: Level,
    /// Explicit `EnvFilter` directive
    pub filter: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Compact,
            level: Level::WARN,
            filter: None,
        }
    }
}

static SESSION_ID: OnceLock<Uuid> = OnceLock::new();

/// Identifier of this provider process, logged once when tracing starts.
#[must_use]
pub fn session_id() -> Uuid {
    *SESSION_ID.get_or_init(Uuid::new_v4)
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::TRACE => "trace",
        Level::DEBUG => "debug",
        Level::INFO => "info",
        Level::WARN => "warn",
        Level::ERROR => "error",
    }
}

/// Map a Terraform `TF_LOG` value to a level. `JSON` means trace.
#[must_use]
pub fn tf_log_level(value: &str) -> Option<Level> {
    match value.trim().to_uppercase().as_str() {
        "TRACE" | "JSON" => Some(Level::TRACE),
        "DEBUG" => Some(Level::DEBUG),
        "INFO" => Some(Level::INFO),
        "WARN" => Some(Level::WARN),
        "ERROR" => Some(Level::ERROR),
        _ => None,
    }
}

/// The filter directive for `config`, given the current `TF_LOG` value.
#[must_use]
pub fn filter_directive(config: &LoggingConfig, tf_log: Option<&str>) -> String {
    if let Some(filter) = &config.filter {
        return filter.clone();
    }
    let level = tf_log.and_then(tf_log_level).unwrap_or(config.level);
    let level = level_name(level);
    CRATE_TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if the filter is invalid or a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> miette::Result<()> {
    let tf_log = std::env::var("TF_LOG").ok();
    let directive = filter_directive(config, tf_log.as_deref());
    let env_filter = EnvFilter::try_new(&directive)
        .map_err(|e| miette::miette!("Failed to create tracing filter {directive:?}: {e}"))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(io::stderr)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(io::stderr)
                    .with_target(false),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
    };
    result.map_err(|e| miette::miette!("Failed to install tracing subscriber: {e}"))?;

    tracing::info!(
        session_id = %session_id(),
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        "Tracing initialized for the Circonus provider"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_parsing() {
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("loud".parse::<LogFormat>().is_err());
    }

    #[test]
    fn tf_log_overrides_default_level() {
        let config = LoggingConfig::default();
        assert_eq!(
            filter_directive(&config, None),
            "circonus_provider=warn,circonus_api=warn"
        );
        assert_eq!(
            filter_directive(&config, Some("debug")),
            "circonus_provider=debug,circonus_api=debug"
        );
        assert_eq!(
            filter_directive(&config, Some("bogus")),
            "circonus_provider=warn,circonus_api=warn"
        );
    }

    #[test]
    fn explicit_filter_wins() {
        let config = LoggingConfig {
            filter: Some("circonus_api=trace".into()),
            ..LoggingConfig::default()
        };
        assert_eq!(filter_directive(&config, Some("error")), "circonus_api=trace");
    }

    #[test]
    fn init_twice_fails_cleanly() {
        let config = LoggingConfig::default();
        let _ = init_logging(&config);
        assert!(init_logging(&config).is_err());
    }

    #[test]
    fn session_id_is_stable() {
        assert_eq!(session_id(), session_id());
    }
}
