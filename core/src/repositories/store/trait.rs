//! Credential store trait defining the persistence contract.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::account::Account;
use crate::domain::entities::verification_token::{TokenPurpose, VerificationToken};
use crate::errors::CommandResult;

/// Durable record of accounts and verification tokens
///
/// Implementations must guarantee:
/// - username and email uniqueness across accounts,
/// - compare-and-swap semantics on [`Self::update_account`],
/// - that [`Self::issue_token`] supersedes and inserts in one atomic
///   step, so concurrent issuance never leaves two active tokens for
///   the same (account, purpose),
/// - that the `consume_token_and_*` operations are atomic: the token's
///   `consumed_at` and the authorized effect commit together or not at
///   all, even under concurrent redemption of the same token.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Find an account by its unique identifier
    async fn find_account_by_id(&self, id: Uuid) -> CommandResult<Option<Account>>;

    /// Find an account by username
    async fn find_account_by_username(&self, username: &str) -> CommandResult<Option<Account>>;

    /// Find an account by email address
    async fn find_account_by_email(&self, email: &str) -> CommandResult<Option<Account>>;

    /// Create a new account
    ///
    /// Fails with `Conflict` when the username or email is already owned
    /// by another account.
    async fn insert_account(&self, account: Account) -> CommandResult<Account>;

    /// Commit an account mutation via compare-and-swap on the version
    ///
    /// The write succeeds only when the stored version still equals
    /// `expected_version`; the committed record carries
    /// `expected_version + 1`. Fails with `VersionConflict` when the
    /// version moved, `NotFound` when the account vanished, and
    /// `Conflict` when a unique field collides with another account.
    async fn update_account(&self, account: Account, expected_version: i64)
        -> CommandResult<Account>;

    /// Persist a freshly issued token, superseding any active token of
    /// the same (account, purpose)
    ///
    /// Invalidation and insertion commit together, so at most one token
    /// per (account, purpose) is ever active, even when two issuances
    /// race. Returns the number of prior active tokens superseded.
    async fn issue_token(&self, token: VerificationToken) -> CommandResult<u64>;

    /// Look up a token by the hash of its raw value
    async fn find_token_by_hash(&self, token_hash: &str)
        -> CommandResult<Option<VerificationToken>>;

    /// Atomically consume an email-verify token and mark the owning
    /// account's email as verified
    ///
    /// Fails with `InvalidOrExpiredToken` when the token is no longer
    /// active, including when a concurrent redemption won the race.
    async fn consume_token_and_verify_email(&self, token_id: Uuid) -> CommandResult<Account>;

    /// Atomically consume a password-reset token and commit the new
    /// password hash on the owning account
    async fn consume_token_and_set_password(
        &self,
        token_id: Uuid,
        new_password_hash: &str,
    ) -> CommandResult<Account>;
}
