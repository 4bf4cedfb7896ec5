//! RPC listener configuration

use serde::{Deserialize, Serialize};

use super::{env_or, env_or_else};

/// Configuration for the connection-oriented RPC binding
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RpcServerConfig {
    /// Listen host address
    pub host: String,

    /// Listen port
    pub port: u16,
}

impl Default for RpcServerConfig {
    fn default() -> Self {
        Self {
            host: String::from("0.0.0.0"),
            port: 7050,
        }
    }
}

impl RpcServerConfig {
    /// Build the configuration from `RPC_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or_else("RPC_HOST", &defaults.host),
            port: env_or("RPC_PORT", defaults.port),
        }
    }

    /// Get the bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
