use serde::{Deserialize, Deserializer};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::engine::{
    SessionOptions, DEFAULT_KEY, DEFAULT_ORIGIN_CHANNEL, DEFAULT_POSITION_CHANNELS, DEFAULT_SECTION,
};
use crate::registry::FieldSpec;
use crate::series::ViewWindow;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub web: WebConfig,
    /// Fields registered at start, after the saved ones.
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_origin_channel")]
    pub origin_channel: String,
    #[serde(default = "default_position_channels")]
    pub position_channels: Vec<String>,
    #[serde(default = "default_poll_interval", deserialize_with = "deserialize_duration")]
    pub poll_interval: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            origin_channel: default_origin_channel(),
            position_channels: default_position_channels(),
            poll_interval: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_refresh_period", deserialize_with = "deserialize_duration")]
    pub refresh_period: Duration,
    /// Initial time limit, in the same forms the time-limit box accepts.
    #[serde(default)]
    pub time_window: Option<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            refresh_period: default_refresh_period(),
            time_window: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    /// Project store file; subscriptions are not saved without one.
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default = "default_section")]
    pub section: String,
    #[serde(default = "default_key")]
    pub key: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            path: None,
            section: default_section(),
            key: default_key(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self { bind: default_bind() }
    }
}

fn default_origin_channel() -> String {
    DEFAULT_ORIGIN_CHANNEL.to_string()
}

fn default_position_channels() -> Vec<String> {
    DEFAULT_POSITION_CHANNELS.iter().map(|c| c.to_string()).collect()
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(100)
}

fn default_refresh_period() -> Duration {
    Duration::from_millis(500)
}

fn default_section() -> String {
    DEFAULT_SECTION.to_string()
}

fn default_key() -> String {
    DEFAULT_KEY.to_string()
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // an empty file means all defaults
        if yaml.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.transport;
        if t.origin_channel.trim().is_empty() {
            return Err(ConfigError::Invalid("origin_channel must not be empty".into()));
        }
        if t.position_channels.is_empty() {
            return Err(ConfigError::Invalid("at least one position channel is required".into()));
        }
        if t.position_channels.iter().any(|c| c.trim().is_empty()) {
            return Err(ConfigError::Invalid("position channel names must not be empty".into()));
        }
        if t.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("poll_interval must be positive".into()));
        }
        if self.display.refresh_period.is_zero() {
            return Err(ConfigError::Invalid("refresh_period must be positive".into()));
        }
        if let Some(text) = &self.display.time_window {
            ViewWindow::parse_limit(text).map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        if self.persistence.section.trim().is_empty() || self.persistence.key.trim().is_empty() {
            return Err(ConfigError::Invalid("persistence section and key must not be empty".into()));
        }
        for spec in &self.fields {
            spec.validate()
                .map_err(|e| ConfigError::Invalid(format!("field {}: {}", spec.key(), e)))?;
        }
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            origin_channel: self.transport.origin_channel.clone(),
            position_channels: self.transport.position_channels.clone(),
            poll_interval: self.transport.poll_interval,
            section: self.persistence.section.clone(),
            key: self.persistence.key.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert_eq!(config.session_options(), SessionOptions::default());
        assert_eq!(config.display.refresh_period, Duration::from_millis(500));
        assert_eq!(config.web.bind, "127.0.0.1:8080");
        assert!(config.persistence.path.is_none());
    }

    #[test]
    fn parses_full_config() {
        let yaml = r#"
transport:
  origin_channel: ORIGIN
  position_channels: [NAV]
  poll_interval: 50ms
display:
  refresh_period: 1s
  time_window: 5m
persistence:
  path: /tmp/project.yaml
web:
  bind: 0.0.0.0:9000
fields:
  - channel: CTD
    type_descriptor: float
    field_name: temperature
    sample_rate_hz: 1.0
    display_name: Temperature
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.transport.position_channels, vec!["NAV".to_string()]);
        assert_eq!(config.transport.poll_interval, Duration::from_millis(50));
        assert_eq!(config.display.refresh_period, Duration::from_secs(1));
        assert_eq!(config.persistence.section, DEFAULT_SECTION);
        assert_eq!(config.fields.len(), 1);
        assert!(config.fields[0].layer_enabled);
    }

    #[test]
    fn rejects_invalid_settings() {
        assert!(matches!(
            Config::from_yaml("transport:\n  origin_channel: ' '\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_yaml("display:\n  refresh_period: 0s\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_yaml("display:\n  time_window: yesterday-ish\n"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::from_yaml("display:\n  refresh_period: soon\n"),
            Err(ConfigError::Yaml(_))
        ));
    }
}
