//! Application configuration assembled from the environment

use std::str::FromStr;

use users_shared::config::{
    BrokerConfig, DatabaseConfig, EmailGatewayConfig, Environment, RetryConfig, RpcServerConfig,
    TokenTtlConfig,
};

/// Which transport the process serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportBinding {
    /// Durable queue with manual acknowledgment
    Queue,
    /// TCP JSON-lines request-reply
    Rpc,
}

impl FromStr for TransportBinding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "queue" => Ok(TransportBinding::Queue),
            "rpc" => Ok(TransportBinding::Rpc),
            other => Err(format!("unknown transport binding: {}", other)),
        }
    }
}

impl std::fmt::Display for TransportBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportBinding::Queue => write!(f, "queue"),
            TransportBinding::Rpc => write!(f, "rpc"),
        }
    }
}

/// Full process configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Selected transport binding
    pub binding: TransportBinding,
    /// Queue broker settings
    pub broker: BrokerConfig,
    /// Retry and backoff policy
    pub retry: RetryConfig,
    /// Verification token lifetimes
    pub tokens: TokenTtlConfig,
    /// MySQL pool settings
    pub database: DatabaseConfig,
    /// Email gateway settings
    pub email: EmailGatewayConfig,
    /// RPC listener settings
    pub rpc: RpcServerConfig,
}

impl AppConfig {
    /// Assemble the configuration from environment variables
    ///
    /// An unrecognized `TRANSPORT_BINDING` falls back to the queue
    /// binding with a warning rather than failing startup.
    pub fn from_env() -> Self {
        let binding = std::env::var("TRANSPORT_BINDING")
            .ok()
            .and_then(|raw| match raw.parse() {
                Ok(binding) => Some(binding),
                Err(message) => {
                    tracing::warn!(%message, "falling back to queue binding");
                    None
                }
            })
            .unwrap_or(TransportBinding::Queue);

        Self {
            environment: Environment::from_env(),
            binding,
            broker: BrokerConfig::from_env(),
            retry: RetryConfig::from_env(),
            tokens: TokenTtlConfig::from_env(),
            database: DatabaseConfig::from_env(),
            email: EmailGatewayConfig::from_env(),
            rpc: RpcServerConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binding_parses_case_insensitively() {
        assert_eq!("queue".parse(), Ok(TransportBinding::Queue));
        assert_eq!("RPC".parse(), Ok(TransportBinding::Rpc));
    }

    #[test]
    fn test_unknown_binding_is_rejected() {
        assert!("http".parse::<TransportBinding>().is_err());
    }
}
