//! Broker connection configuration

use serde::{Deserialize, Serialize};

use super::{env_or, env_or_else};

/// Queue broker configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BrokerConfig {
    /// Broker connection URL
    pub url: String,

    /// Queue the consumer pulls commands from
    pub queue: String,

    /// Destination for messages that exhausted their retries
    pub dead_letter_queue: String,

    /// Maximum number of unacknowledged deliveries held at once
    #[serde(default = "default_prefetch")]
    pub prefetch: u16,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            url: String::from("amqp://127.0.0.1:5672"),
            queue: String::from("users"),
            dead_letter_queue: String::from("users.dead-letter"),
            prefetch: default_prefetch(),
        }
    }
}

impl BrokerConfig {
    /// Build the configuration from `BROKER_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            url: env_or_else("BROKER_URL", &defaults.url),
            queue: env_or_else("BROKER_QUEUE", &defaults.queue),
            dead_letter_queue: env_or_else("BROKER_DEAD_LETTER_QUEUE", &defaults.dead_letter_queue),
            prefetch: env_or("BROKER_PREFETCH", defaults.prefetch),
        }
    }
}

fn default_prefetch() -> u16 {
    16
}
