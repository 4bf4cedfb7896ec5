//! Token service configuration

use chrono::Duration;

use users_shared::config::TokenTtlConfig;

use crate::domain::entities::verification_token::TokenPurpose;

/// Configuration for the token lifecycle manager
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// Lifetime of email-verify tokens
    pub email_verify_ttl: Duration,

    /// Lifetime of password-reset tokens
    pub password_reset_ttl: Duration,

    /// Number of random bytes in a raw token
    pub token_bytes: usize,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self::from(TokenTtlConfig::default())
    }
}

impl From<TokenTtlConfig> for TokenServiceConfig {
    fn from(ttl: TokenTtlConfig) -> Self {
        Self {
            email_verify_ttl: Duration::minutes(ttl.email_verify_ttl_minutes),
            password_reset_ttl: Duration::minutes(ttl.password_reset_ttl_minutes),
            token_bytes: 32,
        }
    }
}

impl TokenServiceConfig {
    /// Lifetime for a token of the given purpose
    pub fn ttl_for(&self, purpose: TokenPurpose) -> Duration {
        match purpose {
            TokenPurpose::EmailVerify => self.email_verify_ttl,
            TokenPurpose::PasswordReset => self.password_reset_ttl,
        }
    }
}
