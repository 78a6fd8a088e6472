//! Run configuration.
//!
//! Resolution order: built-in defaults, then an optional YAML file, then
//! environment variables (`BASE_URL`, `WAIT_SECONDS`, `HEADLESS`,
//! `CHROMIUM_PATH`). Command-line flags are applied last by the CLI.

use crate::result::{ProbeError, ProbeResult};
use crate::wait::WaitOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default service URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default explicit-wait timeout in seconds
pub const DEFAULT_WAIT_SECONDS: u64 = 60;

/// Configuration shared by the web steps and route checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Root URL of the catalog service
    pub base_url: String,
    /// Timeout for explicit waits
    pub wait_seconds: u64,
    /// Run the browser without a window
    pub headless: bool,
    /// Path to chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            wait_seconds: DEFAULT_WAIT_SECONDS,
            headless: true,
            chromium_path: None,
        }
    }
}

impl ProbeConfig {
    /// Defaults overlaid with the process environment
    pub fn from_env() -> ProbeResult<Self> {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> ProbeResult<Self> {
        let base = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        base.with_env(|key| std::env::var(key).ok())
    }

    /// Parse a YAML document; missing keys keep their defaults
    pub fn from_yaml(yaml: &str) -> ProbeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml)?;
        config.validate()
    }

    /// Read and parse a YAML file
    pub fn from_yaml_file(path: &Path) -> ProbeResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        tracing::debug!("loaded config from {}", path.display());
        Self::from_yaml(&yaml)
    }

    /// Overlay variables found through `lookup`
    pub fn with_env<F>(mut self, lookup: F) -> ProbeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("BASE_URL") {
            self.base_url = url;
        }
        if let Some(secs) = lookup("WAIT_SECONDS") {
            self.wait_seconds = secs.trim().parse().map_err(|_| {
                ProbeError::config(format!("WAIT_SECONDS must be an integer, got '{secs}'"))
            })?;
        }
        if let Some(headless) = lookup("HEADLESS") {
            self.headless = parse_flag(&headless).ok_or_else(|| {
                ProbeError::config(format!("HEADLESS must be true or false, got '{headless}'"))
            })?;
        }
        if let Some(path) = lookup("CHROMIUM_PATH") {
            self.chromium_path = Some(path);
        }
        self.validate()
    }

    /// Replace the base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Replace the wait timeout
    #[must_use]
    pub const fn with_wait_seconds(mut self, seconds: u64) -> Self {
        self.wait_seconds = seconds;
        self
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Explicit-wait options derived from `wait_seconds`
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions::from_seconds(self.wait_seconds)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> ProbeResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject settings no run can use
    pub fn validate(self) -> ProbeResult<Self> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ProbeError::config(format!(
                "base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        Ok(self)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
