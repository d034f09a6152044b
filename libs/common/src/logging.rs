//! Logging setup for the stove tools
//!
//! Console output in one of three formats, plus an optional daily-rolled file.
//! `RUST_LOG`, when set, replaces the configured level.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt::{self as tracing_fmt, MakeWriter},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::error::{Error, Result};

/// Console/file line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
    #[default]
    Compact,
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(Error::logging(format!("Unknown log format: {other}"))),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => write!(f, "json"),
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Compact => write!(f, "compact"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Filter directive (`info`, `stove_protocol=debug`, ...)
    pub level: String,
    pub format: LogFormat,
    /// ANSI colors on the console
    pub ansi: bool,
    /// Also write to this file, rolled daily
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
            ansi: true,
            file: None,
        }
    }
}

impl LogConfig {
    pub fn with_level(level: impl Into<String>) -> Self {
        Self {
            level: level.into(),
            ..Self::default()
        }
    }
}

/// `RUST_LOG` if set and non-blank, otherwise the configured level
fn filter_directive<'a>(level: &'a str, rust_log: Option<&'a str>) -> &'a str {
    rust_log.filter(|s| !s.trim().is_empty()).unwrap_or(level)
}

fn build_filter(level: &str, rust_log: Option<&str>) -> Result<EnvFilter> {
    let directive = filter_directive(level, rust_log);
    EnvFilter::try_new(directive)
        .map_err(|e| Error::logging(format!("Invalid log level '{directive}': {e}")))
}

fn format_layer<S, W>(
    format: LogFormat,
    writer: W,
    ansi: bool,
) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => tracing_fmt::layer()
            .json()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .boxed(),
        LogFormat::Pretty => tracing_fmt::layer()
            .pretty()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => tracing_fmt::layer()
            .compact()
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(false)
            .boxed(),
    }
}

/// Install the global subscriber
///
/// Returns the file writer guard when file output is enabled; keep it alive
/// for the lifetime of the process or buffered lines are lost.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let mut layers = Vec::new();
    let mut guard = None;

    let console_filter = build_filter(&config.level, rust_log.as_deref())?;
    layers.push(
        format_layer(config.format, std::io::stderr, config.ansi)
            .with_filter(console_filter)
            .boxed(),
    );

    if let Some(file_path) = &config.file {
        let directory = file_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(directory)?;

        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("stove.log");
        let appender = tracing_appender::rolling::daily(directory, file_name);
        let (non_blocking, file_guard) = tracing_appender::non_blocking(appender);
        guard = Some(file_guard);

        let file_filter = build_filter(&config.level, rust_log.as_deref())?;
        layers.push(
            format_layer(config.format, non_blocking, false)
                .with_filter(file_filter)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| Error::logging(format!("Failed to initialize logging: {e}")))?;

    Ok(guard)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parse() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
        assert_eq!(LogFormat::Compact.to_string(), "compact");
    }

    #[test]
    fn test_rust_log_overrides_level() {
        assert_eq!(
            filter_directive("info", Some("stove_protocol=trace")),
            "stove_protocol=trace"
        );
        assert_eq!(filter_directive("warn", Some("  ")), "warn");
        assert_eq!(filter_directive("debug", None), "debug");
        assert!(build_filter("info", Some("stove_protocol=trace")).is_ok());
    }

    #[test]
    fn test_invalid_level_rejected() {
        assert!(build_filter("stove_protocol=loud", None).is_err());
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: LogConfig = serde_json::from_str(r#"{"format": "json"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, "info");
        assert!(config.file.is_none());
    }
}
