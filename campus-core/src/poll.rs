//! Poll configuration
//!
//! Describes one polling activation: which cached association to refresh,
//! how often, and how many consecutive failures to tolerate.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::key::QueryKey;

/// Default interval between invalidation attempts
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(1000);

/// Default number of consecutive failures tolerated
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Reasons a poll configuration cannot be activated
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollConfigError {
    /// Intervals are carried in whole milliseconds on the wire
    #[error("poll interval must be at least 1ms")]
    IntervalTooShort,

    #[error("max_retries must be at least 1")]
    ZeroMaxRetries,
}

/// Configuration for one polling activation
///
/// Immutable once activated. Changing any field means a new activation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    pub key: QueryKey,
    pub enabled: bool,
    #[serde(rename = "interval_ms", with = "millis")]
    pub interval: Duration,
    pub max_retries: u32,
}

impl PollConfig {
    /// Creates an enabled configuration with the default interval and retry ceiling
    pub fn new(key: QueryKey) -> Self {
        Self {
            key,
            enabled: true,
            interval: DEFAULT_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Checks the numeric constraints of the configuration
    ///
    /// `enabled` is not checked here; a disabled configuration is valid, it
    /// just never starts a timer.
    pub fn validate(&self) -> Result<(), PollConfigError> {
        if self.interval < Duration::from_millis(1) {
            return Err(PollConfigError::IntervalTooShort);
        }

        if self.max_retries == 0 {
            return Err(PollConfigError::ZeroMaxRetries);
        }

        Ok(())
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let ms = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(ms)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
