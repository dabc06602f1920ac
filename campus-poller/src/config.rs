//! Poller configuration
//!
//! Defines the API connection settings and the poll configuration for the
//! query the binary keeps fresh.

use anyhow::Context;
use campus_core::{KeyPart, PollConfig, QueryKey};
use std::time::Duration;

/// Poller configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Campus API base URL (e.g., "http://localhost:3000")
    pub api_url: String,

    /// What to poll, how often, and how many failures to tolerate
    pub poll: PollConfig,

    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(api_url: String, key: QueryKey) -> Self {
        Self {
            api_url,
            poll: PollConfig::new(key),
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - CAMPUS_API_URL (required)
    /// - POLL_KEY (required, e.g. "lessons/7/comments")
    /// - POLL_INTERVAL_MS (optional, default: 1000)
    /// - POLL_MAX_RETRIES (optional, default: 3)
    /// - POLL_ENABLED (optional, default: true)
    /// - REQUEST_TIMEOUT_SECS (optional, default: 10)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Creates configuration from an arbitrary variable lookup
    ///
    /// Unparseable optional values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let api_url = lookup("CAMPUS_API_URL")
            .ok_or_else(|| anyhow::anyhow!("CAMPUS_API_URL environment variable not set"))?;

        let key = lookup("POLL_KEY")
            .ok_or_else(|| anyhow::anyhow!("POLL_KEY environment variable not set"))?;
        let key = QueryKey::parse(&key).with_context(|| format!("Invalid POLL_KEY '{}'", key))?;

        let mut config = Self::new(api_url, key);

        if let Some(interval) = lookup("POLL_INTERVAL_MS").and_then(|s| s.parse::<u64>().ok()) {
            config.poll.interval = Duration::from_millis(interval);
        }

        if let Some(max_retries) = lookup("POLL_MAX_RETRIES").and_then(|s| s.parse::<u32>().ok())
        {
            config.poll.max_retries = max_retries;
        }

        if let Some(enabled) = lookup("POLL_ENABLED").and_then(|s| parse_flag(&s)) {
            config.poll.enabled = enabled;
        }

        if let Some(timeout) = lookup("REQUEST_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            config.request_timeout = Duration::from_secs(timeout);
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_url.is_empty() {
            anyhow::bail!("api_url cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        self.poll.validate()?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(
            "http://localhost:3000".to_string(),
            QueryKey::from(KeyPart::from("courses")),
        )
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
