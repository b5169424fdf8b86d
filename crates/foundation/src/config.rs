//! Configuration for foundation clients.

use std::time::Duration;

use mysql_tools_core::{Backoff, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Marketplace offering that provides the MySQL plans.
pub const DEFAULT_OFFERING: &str = "p.mysql";

/// Configuration shared by every [`crate::Foundation`] client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundationConfig {
    /// Path to the cf CLI executable.
    #[serde(default = "default_cli_path")]
    pub cli_path: String,

    /// Marketplace offering queried when checking plans.
    #[serde(default = "default_offering")]
    pub offering: String,

    /// Attempt budget for point-in-time reads.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff.
    #[serde(with = "duration_secs", default = "default_base_delay")]
    pub base_delay: Duration,

    /// Pause between status reads while an operation is in progress.
    #[serde(with = "duration_secs", default = "default_poll_interval")]
    pub poll_interval: Duration,
}

impl Default for FoundationConfig {
    fn default() -> Self {
        Self {
            cli_path: default_cli_path(),
            offering: default_offering(),
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl FoundationConfig {
    /// Create a new config with the given CLI path.
    pub fn with_cli_path(cli_path: impl Into<String>) -> Self {
        Self {
            cli_path: cli_path.into(),
            ..Default::default()
        }
    }

    /// Set the marketplace offering.
    #[must_use]
    pub fn offering(mut self, offering: impl Into<String>) -> Self {
        self.offering = offering.into();
        self
    }

    /// Set the attempt budget.
    #[must_use]
    pub const fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the backoff base delay.
    #[must_use]
    pub const fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Set the status poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Backoff policy described by this configuration.
    #[must_use]
    pub fn backoff(&self) -> Backoff {
        Backoff::new()
            .with_max_attempts(self.max_attempts)
            .with_base_delay(self.base_delay)
            .with_poll_interval(self.poll_interval)
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a config error if a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns a config error if a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup("MYSQL_TOOLS_CF_PATH") {
            config.cli_path = path;
        }

        if let Some(offering) = lookup("RECIPIENT_PRODUCT_NAME") {
            config.offering = offering;
        }

        if let Some(attempts) = lookup("MYSQL_TOOLS_MAX_ATTEMPTS") {
            config.max_attempts = attempts.trim().parse().map_err(|e| {
                Error::config_error(format!("MYSQL_TOOLS_MAX_ATTEMPTS={attempts}: {e}"))
            })?;
        }

        if let Some(secs) = lookup("MYSQL_TOOLS_POLL_INTERVAL_SECS") {
            let secs: u64 = secs.trim().parse().map_err(|e| {
                Error::config_error(format!("MYSQL_TOOLS_POLL_INTERVAL_SECS={secs}: {e}"))
            })?;
            config.poll_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

fn default_cli_path() -> String {
    if let Ok(path) = which::which("cf") {
        return path.to_string_lossy().to_string();
    }
    "cf".to_string()
}

fn default_offering() -> String {
    DEFAULT_OFFERING.to_string()
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_base_delay() -> Duration {
    DEFAULT_BASE_DELAY
}

const fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

/// Serialization helper for Duration as seconds.
mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
