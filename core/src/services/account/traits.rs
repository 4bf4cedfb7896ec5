//! Collaborator traits for the account command handlers

use async_trait::async_trait;

use crate::errors::CommandResult;

/// Opaque one-way password hashing collaborator
pub trait PasswordHasher: Send + Sync {
    /// Hash a plaintext password for storage
    fn hash(&self, password: &str) -> CommandResult<String>;

    /// Verify a plaintext password against a stored hash
    fn verify(&self, password: &str, password_hash: &str) -> CommandResult<bool>;
}

/// Fire-and-forget email delivery collaborator
///
/// Receives the raw token exactly once; failures are transient from the
/// delivery layer's point of view.
#[async_trait]
pub trait EmailNotifier: Send + Sync {
    /// Send an email-verification message carrying the raw token
    async fn send_email_verification(&self, email: &str, raw_token: &str) -> CommandResult<()>;

    /// Send a password-reset message carrying the raw token
    async fn send_password_reset(&self, email: &str, raw_token: &str) -> CommandResult<()>;
}
