//! Verification token time-to-live configuration

use serde::{Deserialize, Serialize};

use super::env_or;

/// Time-to-live settings for single-use verification tokens
///
/// Email verification tokens are long-lived; password reset tokens are
/// deliberately short. Both are policy, not hard-coded constants.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct TokenTtlConfig {
    /// Lifetime of an email-verify token, in minutes
    #[serde(default = "default_email_verify_ttl_minutes")]
    pub email_verify_ttl_minutes: i64,

    /// Lifetime of a password-reset token, in minutes
    #[serde(default = "default_password_reset_ttl_minutes")]
    pub password_reset_ttl_minutes: i64,
}

impl Default for TokenTtlConfig {
    fn default() -> Self {
        Self {
            email_verify_ttl_minutes: default_email_verify_ttl_minutes(),
            password_reset_ttl_minutes: default_password_reset_ttl_minutes(),
        }
    }
}

impl TokenTtlConfig {
    /// Build the configuration from `TOKEN_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            email_verify_ttl_minutes: env_or(
                "TOKEN_EMAIL_VERIFY_TTL_MINUTES",
                defaults.email_verify_ttl_minutes,
            ),
            password_reset_ttl_minutes: env_or(
                "TOKEN_PASSWORD_RESET_TTL_MINUTES",
                defaults.password_reset_ttl_minutes,
            ),
        }
    }
}

/// 24 hours
fn default_email_verify_ttl_minutes() -> i64 {
    24 * 60
}

/// 15 minutes
fn default_password_reset_ttl_minutes() -> i64 {
    15
}
