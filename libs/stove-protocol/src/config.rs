//! Stove connection configuration
//!
//! Loaded with figment, highest priority last:
//! 1. Built-in defaults
//! 2. Optional config file (YAML, TOML or JSON by extension)
//! 3. `STOVE_`-prefixed environment variables (e.g. `STOVE_HOST`, `STOVE_PORT`)

use std::path::Path;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_PORT, DEFAULT_RESPONSE_TIMEOUT,
    DEFAULT_RETRY_DELAY,
};
use crate::error::{Result, StoveError};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "STOVE_";

/// Connection and poll-loop settings for one stove
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoveConfig {
    pub host: String,
    pub port: u16,
    pub poll_interval_ms: u64,
    pub retry_delay_ms: u64,
    pub response_timeout_ms: u64,
    pub connect_timeout_ms: u64,
}

impl Default for StoveConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT.as_millis() as u64,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl StoveConfig {
    /// Config for `host` with default port and timing
    pub fn for_host(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }

    /// Load defaults, then `path` if given, then `STOVE_*` variables
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_prefix(path, ENV_PREFIX)
    }

    /// Same as [`load`](Self::load) with a custom environment prefix
    pub fn load_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(StoveConfig::default()));

        if let Some(path) = path {
            figment = merge_file(figment, path)?;
        }

        let config: StoveConfig = figment.merge(Env::prefixed(env_prefix)).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(StoveError::config("host must not be empty"));
        }
        if self.port == 0 {
            return Err(StoveError::config("port must not be 0"));
        }
        for (name, value) in [
            ("poll_interval_ms", self.poll_interval_ms),
            ("retry_delay_ms", self.retry_delay_ms),
            ("response_timeout_ms", self.response_timeout_ms),
            ("connect_timeout_ms", self.connect_timeout_ms),
        ] {
            if value == 0 {
                return Err(StoveError::config(format!("{name} must be greater than 0")));
            }
        }
        Ok(())
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    if !path.exists() {
        return Err(StoveError::config(format!(
            "Config file not found: {}",
            path.display()
        )));
    }

    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| StoveError::config("Config file must have an extension"))?;

    match extension {
        "toml" => Ok(figment.merge(Toml::file(path))),
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        "json" => Ok(figment.merge(Json::file(path))),
        _ => Err(StoveError::config(format!(
            "Unsupported config file format: {extension}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = StoveConfig::default();
        assert_eq!(config.port, 5001);
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.retry_delay(), Duration::from_secs(5));
        assert_eq!(config.response_timeout(), Duration::from_secs(60));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_without_file_uses_defaults() {
        let config = StoveConfig::load_with_prefix(None, "STOVE_TEST_NOFILE_").unwrap();
        assert_eq!(config, StoveConfig::default());
    }

    #[test]
    fn test_load_yaml_file_partial_override() {
        let file = write_file(".yaml", "host: 192.168.1.40\nretry_delay_ms: 2500\n");
        let config = StoveConfig::load_with_prefix(Some(file.path()), "STOVE_TEST_YAML_").unwrap();
        assert_eq!(config.host, "192.168.1.40");
        assert_eq!(config.retry_delay(), Duration::from_millis(2500));
        assert_eq!(config.port, 5001);
    }

    #[test]
    fn test_load_toml_file() {
        let file = write_file(".toml", "host = \"stove.local\"\nport = 6001\n");
        let config = StoveConfig::load_with_prefix(Some(file.path()), "STOVE_TEST_TOML_").unwrap();
        assert_eq!(config.address(), "stove.local:6001");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = write_file(".json", r#"{"host": "10.0.0.5", "port": 6001}"#);
        std::env::set_var("STOVE_TEST_ENV_PORT", "7001");
        let config = StoveConfig::load_with_prefix(Some(file.path()), "STOVE_TEST_ENV_").unwrap();
        std::env::remove_var("STOVE_TEST_ENV_PORT");
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 7001);
    }

    #[test]
    fn test_unsupported_extension() {
        let file = write_file(".ini", "host=x");
        let err = StoveConfig::load_with_prefix(Some(file.path()), "STOVE_TEST_INI_").unwrap_err();
        assert!(matches!(err, StoveError::Config(ref m) if m.contains("Unsupported")));
    }

    #[test]
    fn test_missing_file() {
        let err = StoveConfig::load(Some(Path::new("/nonexistent/stove.yaml"))).unwrap_err();
        assert!(matches!(err, StoveError::Config(_)));
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = StoveConfig::default();
        config.port = 0;
        assert!(config.validate().is_err());

        let mut config = StoveConfig::default();
        config.response_timeout_ms = 0;
        assert!(config.validate().is_err());

        let config = StoveConfig::for_host("  ");
        assert!(config.validate().is_err());
    }
}
