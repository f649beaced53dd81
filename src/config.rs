//! Runtime configuration.
//!
//! Read from environment variables, then optionally overridden by CLI flags:
//! - `RSVP_API_URL` - Base URL of the API (default: `http://localhost:8000/api`)
//! - `RSVP_STORAGE_DIR` - Where session snapshots live (default: platform data dir)
//! - `RSVP_TIMEOUT_SECS` - Per-request timeout in seconds (default: 30)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::store::{self, StoreError};

/// Default URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API URL must be an absolute http(s) URL, got {0:?}")]
    InvalidApiUrl(String),

    #[error("Timeout must be a positive number of seconds, got {0:?}")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL without a trailing slash; request paths are appended to it.
    pub api_url: String,
    /// Explicit snapshot directory. `None` means the platform data dir.
    pub storage_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            storage_dir: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("RSVP_API_URL") {
            config = config.with_api_url(&url)?;
        }
        if let Some(dir) = lookup("RSVP_STORAGE_DIR").filter(|d| !d.trim().is_empty()) {
            config = config.with_storage_dir(dir);
        }
        if let Some(raw) = lookup("RSVP_TIMEOUT_SECS") {
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| ConfigError::InvalidTimeout(raw.clone()))?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }

    pub fn with_api_url(mut self, url: &str) -> Result<Self, ConfigError> {
        self.api_url = normalize_api_url(url)?;
        Ok(self)
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Directory holding session snapshots.
    pub fn resolve_storage_dir(&self) -> Result<PathBuf, StoreError> {
        match &self.storage_dir {
            Some(dir) => Ok(dir.clone()),
            None => store::default_dir(),
        }
    }
}

fn normalize_api_url(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim().trim_end_matches('/');
    let host = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));

    match host {
        Some(rest) if !rest.is_empty() && !rest.starts_with('/') => Ok(url.to_string()),
        _ => Err(ConfigError::InvalidApiUrl(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn reads_every_variable() {
        let config = Config::from_lookup(lookup(&[
            ("RSVP_API_URL", "https://events.example.com/api/"),
            ("RSVP_STORAGE_DIR", "/tmp/rsvp"),
            ("RSVP_TIMEOUT_SECS", "5"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://events.example.com/api");
        assert_eq!(config.storage_dir, Some(PathBuf::from("/tmp/rsvp")));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_relative_or_hostless_urls() {
        for url in ["events.example.com", "/api", "http://", "https:///api", "ftp://x"] {
            assert_eq!(
                Config::default().with_api_url(url),
                Err(ConfigError::InvalidApiUrl(url.to_string()))
            );
        }
    }

    #[test]
    fn rejects_bad_timeouts() {
        for raw in ["0", "-1", "soon"] {
            let result = Config::from_lookup(lookup(&[("RSVP_TIMEOUT_SECS", raw)]));
            assert_eq!(result, Err(ConfigError::InvalidTimeout(raw.to_string())));
        }
    }

    #[test]
    fn explicit_storage_dir_wins() {
        let config = Config::default().with_storage_dir("/data/rsvp");
        assert_eq!(config.resolve_storage_dir().unwrap(), PathBuf::from("/data/rsvp"));
    }
}
