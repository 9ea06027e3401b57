use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    /// JSON host set; `None` keeps hosts in memory only
    pub hosts_file: Option<PathBuf>,
    /// Seconds between poll rounds
    pub poll_interval: u64,
    /// Per-probe deadline in seconds
    pub probe_timeout: u64,
    pub max_hosts: usize,
    /// Samples kept per host
    pub history_size: usize,
    /// Consecutive failures before a down notification
    pub failure_threshold: u32,
    pub notify_webhook: Option<String>,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            hosts_file: None,
            poll_interval: 10,
            probe_timeout: 10,
            max_hosts: 100,
            history_size: 10080, // 7 days of 1 minute polls
            failure_threshold: 3,
            notify_webhook: None,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Defaults, then the TOML file named by `HOSTWATCH_CONFIG`, then
    /// `HOSTWATCH_*` environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let base = match env::var("HOSTWATCH_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        let config = base.with_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        if let Some(port) = parse_var(&lookup, "HOSTWATCH_PORT")? {
            self.port = port;
        }
        if let Some(path) = lookup("HOSTWATCH_HOSTS_FILE") {
            self.hosts_file = Some(PathBuf::from(path));
        }
        if let Some(secs) = parse_var(&lookup, "HOSTWATCH_POLL_INTERVAL")? {
            self.poll_interval = secs;
        }
        if let Some(secs) = parse_var(&lookup, "HOSTWATCH_PROBE_TIMEOUT")? {
            self.probe_timeout = secs;
        }
        if let Some(max) = parse_var(&lookup, "HOSTWATCH_MAX_HOSTS")? {
            self.max_hosts = max;
        }
        if let Some(size) = parse_var(&lookup, "HOSTWATCH_HISTORY_SIZE")? {
            self.history_size = size;
        }
        if let Some(threshold) = parse_var(&lookup, "HOSTWATCH_FAILURE_THRESHOLD")? {
            self.failure_threshold = threshold;
        }
        if let Some(url) = lookup("HOSTWATCH_NOTIFY_WEBHOOK") {
            self.notify_webhook = Some(url).filter(|u| !u.is_empty());
        }
        if let Some(level) = lookup("HOSTWATCH_LOG_LEVEL") {
            self.log_level = level;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks = [
            ("poll_interval", self.poll_interval == 0),
            ("probe_timeout", self.probe_timeout == 0),
            ("history_size", self.history_size == 0),
            ("failure_threshold", self.failure_threshold == 0),
        ];
        match checks.iter().find(|(_, is_zero)| *is_zero) {
            Some((key, _)) => Err(ConfigError::Invalid {
                key: key.to_string(),
                reason: "must be greater than zero".to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_secs(self.poll_interval)
    }

    pub fn probe_deadline(&self) -> Duration {
        Duration::from_secs(self.probe_timeout)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e: T::Err| ConfigError::Invalid {
            key: key.to_string(),
            reason: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.poll_period(), Duration::from_secs(10));
        assert_eq!(config.max_hosts, 100);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::default()
            .with_overrides(env_of(&[
                ("HOSTWATCH_PORT", "9000"),
                ("HOSTWATCH_HOSTS_FILE", "/var/lib/hostwatch/hosts.json"),
                ("HOSTWATCH_FAILURE_THRESHOLD", "5"),
                ("HOSTWATCH_NOTIFY_WEBHOOK", "http://hooks.local/alert"),
            ]))
            .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.hosts_file, Some(PathBuf::from("/var/lib/hostwatch/hosts.json")));
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.notify_webhook.as_deref(), Some("http://hooks.local/alert"));
        assert_eq!(config.poll_interval, 10);
    }

    #[test]
    fn test_unparsable_env_is_rejected() {
        let err = Config::default()
            .with_overrides(env_of(&[("HOSTWATCH_MAX_HOSTS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref key, .. } if key == "HOSTWATCH_MAX_HOSTS"));
    }

    #[test]
    fn test_zero_interval_is_invalid() {
        let config = Config {
            poll_interval: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { ref key, .. }) if key == "poll_interval"));
    }

    #[test]
    fn test_toml_file_with_partial_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hostwatch.toml");
        fs::write(
            &path,
            "hosts_file = \"hosts.json\"\npoll_interval = 60\nhistory_size = 1440\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.hosts_file, Some(PathBuf::from("hosts.json")));
        assert_eq!(config.poll_interval, 60);
        assert_eq!(config.history_size, 1440);
        assert_eq!(config.probe_timeout, 10);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(
            Config::from_file("/definitely/not/here.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
