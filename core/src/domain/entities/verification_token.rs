//! Single-use verification token entity.
//!
//! Only the SHA-256 hash of a token is ever stored; the raw value exists
//! once, in the email handed to the notifier. A token moves from issued
//! to consumed or expired and never leaves either terminal state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a verification token authorizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenPurpose {
    /// Proves ownership of the account's email address
    EmailVerify,
    /// Authorizes a one-time password rotation
    PasswordReset,
}

impl std::fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TokenPurpose::EmailVerify => "email-verify",
            TokenPurpose::PasswordReset => "password-reset",
        };
        write!(f, "{}", name)
    }
}

/// Single-use expiring token stored in the credential store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationToken {
    /// Unique identifier for the token
    pub id: Uuid,

    /// Account this token belongs to
    pub account_id: Uuid,

    /// What redeeming this token authorizes
    pub purpose: TokenPurpose,

    /// SHA-256 hex digest of the raw token
    pub token_hash: String,

    /// Timestamp when the token was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the token expires
    pub expires_at: DateTime<Utc>,

    /// Timestamp when the token was consumed, set exactly once
    pub consumed_at: Option<DateTime<Utc>>,
}

impl VerificationToken {
    /// Creates a new token record with the given lifetime
    pub fn new(account_id: Uuid, purpose: TokenPurpose, token_hash: String, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id,
            purpose,
            token_hash,
            created_at: now,
            expires_at: now + ttl,
            consumed_at: None,
        }
    }

    /// Checks if the token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Checks if the token has been consumed
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// A token is active iff it is neither consumed nor expired
    pub fn is_active(&self) -> bool {
        !self.is_consumed() && !self.is_expired()
    }

    /// Invalidates the token by moving its expiry into the past.
    ///
    /// Used when a newer token of the same purpose supersedes this one.
    pub fn invalidate(&mut self) {
        self.expires_at = Utc::now();
    }

    /// Gets the time remaining until expiration, or zero if expired
    pub fn time_until_expiration(&self) -> Duration {
        let now = Utc::now();
        if self.expires_at > now {
            self.expires_at - now
        } else {
            Duration::zero()
        }
    }
}
