//! Delivery retry and backoff policy configuration

use serde::{Deserialize, Serialize};

use super::env_or;

/// Retry policy applied by the delivery guarantee layer
///
/// Transient failures are redelivered up to `max_attempts` times with
/// exponential backoff; after that the message is dead-lettered. Each
/// handling cycle is bounded by `handler_timeout_secs`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetryConfig {
    /// Maximum delivery attempts before dead-lettering (first delivery included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff before a requeue, in milliseconds
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Upper bound on the backoff, in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Per-cycle timeout; an overrun is treated as a transient failure
    #[serde(default = "default_handler_timeout_secs")]
    pub handler_timeout_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            handler_timeout_secs: default_handler_timeout_secs(),
        }
    }
}

impl RetryConfig {
    /// Build the configuration from `RETRY_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_attempts: env_or("RETRY_MAX_ATTEMPTS", defaults.max_attempts),
            base_backoff_ms: env_or("RETRY_BASE_BACKOFF_MS", defaults.base_backoff_ms),
            max_backoff_ms: env_or("RETRY_MAX_BACKOFF_MS", defaults.max_backoff_ms),
            handler_timeout_secs: env_or("RETRY_HANDLER_TIMEOUT_SECS", defaults.handler_timeout_secs),
        }
    }

    /// Backoff for the given delivery attempt (1-based), doubling per
    /// attempt and capped at `max_backoff_ms`.
    pub fn backoff_ms(&self, attempt: u32) -> u64 {
        let shift = attempt.saturating_sub(1).min(16);
        self.base_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms)
    }
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_backoff_ms() -> u64 {
    200
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

fn default_handler_timeout_secs() -> u64 {
    30
}
