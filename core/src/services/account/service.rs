//! Account command handler implementations

use std::sync::Arc;
use uuid::Uuid;

use users_shared::utils::validation::{is_valid_email, is_valid_username};

use crate::domain::entities::account::ProfileFields;
use crate::domain::entities::verification_token::TokenPurpose;
use crate::errors::{CommandError, CommandResult};
use crate::repositories::store::CredentialStore;
use crate::services::token::TokenService;

use super::config::AccountServiceConfig;
use super::traits::{EmailNotifier, PasswordHasher};

/// Account mutation service
///
/// Collaborators arrive through the constructor: the credential store,
/// the token lifecycle manager, the opaque password hasher and the email
/// notifier.
pub struct AccountService<S: CredentialStore, H: PasswordHasher, N: EmailNotifier> {
    store: Arc<S>,
    tokens: TokenService<S>,
    hasher: Arc<H>,
    notifier: Arc<N>,
    config: AccountServiceConfig,
}

impl<S: CredentialStore, H: PasswordHasher, N: EmailNotifier> AccountService<S, H, N> {
    /// Creates a new account service
    pub fn new(
        store: Arc<S>,
        tokens: TokenService<S>,
        hasher: Arc<H>,
        notifier: Arc<N>,
        config: AccountServiceConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            hasher,
            notifier,
            config,
        }
    }

    /// Apply a partial update to non-identity profile fields
    ///
    /// Succeeds without a write when the submitted fields already match.
    pub async fn update_profile(
        &self,
        account_id: Uuid,
        fields: ProfileFields,
    ) -> CommandResult<()> {
        let mut account = self
            .store
            .find_account_by_id(account_id)
            .await?
            .ok_or(CommandError::NotFound)?;

        let read_version = account.version;
        if !account.apply_profile(&fields) {
            tracing::debug!(account_id = %account_id, "profile already up to date");
            return Ok(());
        }

        self.store.update_account(account, read_version).await?;
        tracing::info!(account_id = %account_id, event = "profile_updated", "profile updated");
        Ok(())
    }

    /// Change the unique username via compare-and-swap
    pub async fn change_username(&self, account_id: Uuid, new_username: &str) -> CommandResult<()> {
        if !is_valid_username(new_username) {
            return Err(CommandError::MalformedPayload {
                message: "username must be 3-32 characters of [A-Za-z0-9._-]".to_string(),
            });
        }

        let mut account = self
            .store
            .find_account_by_id(account_id)
            .await?
            .ok_or(CommandError::NotFound)?;

        if account.username == new_username {
            return Ok(());
        }
        if let Some(owner) = self.store.find_account_by_username(new_username).await? {
            if owner.id != account_id {
                return Err(CommandError::Conflict { field: "username" });
            }
        }

        let read_version = account.version;
        account.set_username(new_username.to_string());
        self.store.update_account(account, read_version).await?;

        tracing::info!(account_id = %account_id, event = "username_changed", "username changed");
        Ok(())
    }

    /// Rotate the password after verifying the old one
    ///
    /// Fails uniformly with `InvalidCredential`, whether the account is
    /// missing or the proof is wrong.
    pub async fn change_password(
        &self,
        account_id: Uuid,
        old_password: &str,
        new_password: &str,
    ) -> CommandResult<()> {
        self.check_password_policy(new_password)?;

        let mut account = self
            .store
            .find_account_by_id(account_id)
            .await?
            .ok_or(CommandError::InvalidCredential)?;

        if !self.hasher.verify(old_password, &account.password_hash)? {
            tracing::warn!(
                account_id = %account_id,
                event = "password_proof_rejected",
                "password change rejected"
            );
            return Err(CommandError::InvalidCredential);
        }

        let read_version = account.version;
        account.set_password_hash(self.hasher.hash(new_password)?);
        self.store.update_account(account, read_version).await?;

        tracing::info!(account_id = %account_id, event = "password_changed", "password changed");
        Ok(())
    }

    /// Change the email address; the new address starts unverified and a
    /// fresh email-verify token goes out immediately
    pub async fn change_email(&self, account_id: Uuid, new_email: &str) -> CommandResult<()> {
        if !is_valid_email(new_email) {
            return Err(CommandError::MalformedPayload {
                message: "invalid email address".to_string(),
            });
        }

        let mut account = self
            .store
            .find_account_by_id(account_id)
            .await?
            .ok_or(CommandError::NotFound)?;

        if account.email == new_email {
            // Redelivery after the verification already completed;
            // nothing left to change and nothing left to verify
            if account.email_verified {
                tracing::debug!(account_id = %account_id, "email already set and verified");
                return Ok(());
            }
        } else {
            if let Some(owner) = self.store.find_account_by_email(new_email).await? {
                if owner.id != account_id {
                    return Err(CommandError::Conflict { field: "email" });
                }
            }

            let read_version = account.version;
            account.set_email(new_email.to_string());
            self.store.update_account(account, read_version).await?;
            tracing::info!(account_id = %account_id, event = "email_changed", "email changed");
        }

        // Redelivered or repeated requests land here with the email set
        // but not yet verified; issuing again supersedes the previous
        // token, so exactly one stays active either way.
        self.issue_and_notify(account_id, new_email, TokenPurpose::EmailVerify)
            .await
    }

    /// Issue (or re-issue) an email-verify token
    ///
    /// An already verified email makes this a no-op success, keeping the
    /// operation idempotent for retried deliveries.
    pub async fn send_email_verification(&self, account_id: Uuid) -> CommandResult<()> {
        let account = self
            .store
            .find_account_by_id(account_id)
            .await?
            .ok_or(CommandError::NotFound)?;

        if account.email_verified {
            tracing::debug!(account_id = %account_id, "email already verified, nothing to send");
            return Ok(());
        }

        self.issue_and_notify(account_id, &account.email, TokenPurpose::EmailVerify)
            .await
    }

    /// Redeem an email-verify token
    pub async fn verify_email(&self, raw_token: &str) -> CommandResult<()> {
        let token = self
            .tokens
            .resolve(raw_token, TokenPurpose::EmailVerify)
            .await?;

        // The store re-checks the token under its own lock; duplicate
        // deliveries race here and exactly one wins.
        let account = self.store.consume_token_and_verify_email(token.id).await?;
        tracing::info!(account_id = %account.id, event = "email_verified", "email verified");
        Ok(())
    }

    /// Start a password reset
    ///
    /// Always replies with the same success shape. A token is issued only
    /// when the email maps to an account; an unknown email produces no
    /// observable side effect.
    pub async fn forgot_password(&self, email: &str) -> CommandResult<()> {
        match self.store.find_account_by_email(email).await? {
            Some(account) => {
                self.issue_and_notify(account.id, &account.email, TokenPurpose::PasswordReset)
                    .await
            }
            None => {
                tracing::debug!(event = "password_reset_unknown_email", "no account for email");
                Ok(())
            }
        }
    }

    /// Redeem a password-reset token and commit the new password
    pub async fn reset_password(&self, raw_token: &str, new_password: &str) -> CommandResult<()> {
        self.check_password_policy(new_password)?;

        let token = self
            .tokens
            .resolve(raw_token, TokenPurpose::PasswordReset)
            .await?;

        let new_hash = self.hasher.hash(new_password)?;
        let account = self
            .store
            .consume_token_and_set_password(token.id, &new_hash)
            .await?;
        tracing::info!(account_id = %account.id, event = "password_reset", "password reset");
        Ok(())
    }

    fn check_password_policy(&self, password: &str) -> CommandResult<()> {
        if password.len() < self.config.password_min_length {
            return Err(CommandError::MalformedPayload {
                message: format!(
                    "password must be at least {} characters",
                    self.config.password_min_length
                ),
            });
        }
        Ok(())
    }

    async fn issue_and_notify(
        &self,
        account_id: Uuid,
        email: &str,
        purpose: TokenPurpose,
    ) -> CommandResult<()> {
        let issued = self.tokens.issue(account_id, purpose).await?;
        match purpose {
            TokenPurpose::EmailVerify => {
                self.notifier
                    .send_email_verification(email, &issued.raw)
                    .await
            }
            TokenPurpose::PasswordReset => {
                self.notifier.send_password_reset(email, &issued.raw).await
            }
        }
    }
}
