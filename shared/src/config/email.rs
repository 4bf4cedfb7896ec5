//! Email gateway configuration

use serde::{Deserialize, Serialize};

use super::{env_or, env_or_else};

/// HTTP email gateway settings
///
/// Verification and reset mails go out through an internal HTTP gateway;
/// only its endpoint and sender identity are configurable here.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmailGatewayConfig {
    /// Gateway endpoint that accepts send requests
    pub endpoint: String,

    /// Sender address stamped on outgoing mail
    #[serde(default = "default_from_address")]
    pub from_address: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for EmailGatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: String::from("http://localhost:8025/send"),
            from_address: default_from_address(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl EmailGatewayConfig {
    /// Build the configuration from `EMAIL_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env_or_else("EMAIL_GATEWAY_ENDPOINT", &defaults.endpoint),
            from_address: env_or_else("EMAIL_FROM_ADDRESS", &defaults.from_address),
            request_timeout_secs: env_or(
                "EMAIL_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            ),
        }
    }
}

fn default_from_address() -> String {
    String::from("no-reply@users.local")
}

fn default_request_timeout_secs() -> u64 {
    10
}
