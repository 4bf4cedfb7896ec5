//! Configuration module with business-specific sub-modules
//!
//! This module organizes configuration into logical areas:
//! - `broker` - Queue broker connection and dead-letter configuration
//! - `database` - MySQL connection pool settings
//! - `email` - HTTP email gateway settings
//! - `environment` - Environment detection
//! - `retry` - Delivery retry, backoff and handler timeout policy
//! - `server` - RPC listener configuration
//! - `tokens` - Verification token time-to-live configuration

pub mod broker;
pub mod database;
pub mod email;
pub mod environment;
pub mod retry;
pub mod server;
pub mod tokens;

// Re-export commonly used types
pub use broker::BrokerConfig;
pub use database::DatabaseConfig;
pub use email::EmailGatewayConfig;
pub use environment::Environment;
pub use retry::RetryConfig;
pub use server::RpcServerConfig;
pub use tokens::TokenTtlConfig;

use std::env;
use std::str::FromStr;

/// Read an environment variable, falling back to a default when the
/// variable is absent or fails to parse.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read a string environment variable with a default.
pub(crate) fn env_or_else(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
