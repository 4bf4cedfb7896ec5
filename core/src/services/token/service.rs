//! Token lifecycle service implementation

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::verification_token::{TokenPurpose, VerificationToken};
use crate::errors::{CommandError, CommandResult};
use crate::repositories::store::CredentialStore;

use super::config::TokenServiceConfig;

/// A freshly issued token: the raw value exists only here, on its way
/// to the notifier. The store keeps the hash.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Raw token to hand to the account owner
    pub raw: String,
    /// Stored token record
    pub token: VerificationToken,
}

/// Service managing the issued → consumed/expired token lifecycle
pub struct TokenService<S: CredentialStore> {
    store: Arc<S>,
    config: TokenServiceConfig,
}

impl<S: CredentialStore> TokenService<S> {
    /// Creates a new token service
    pub fn new(store: Arc<S>, config: TokenServiceConfig) -> Self {
        Self { store, config }
    }

    /// SHA-256 hex digest of a raw token
    pub fn hash_token(raw: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Generates a cryptographically random raw token
    fn generate_raw(&self) -> String {
        let mut bytes = vec![0u8; self.config.token_bytes];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Issue a new token, superseding any active token of the same
    /// purpose for the account
    ///
    /// Supersession and insertion are one atomic store operation, so
    /// two issuances racing for the same (account, purpose) still end
    /// with a single active token.
    pub async fn issue(
        &self,
        account_id: Uuid,
        purpose: TokenPurpose,
    ) -> CommandResult<IssuedToken> {
        let raw = self.generate_raw();
        let token = VerificationToken::new(
            account_id,
            purpose,
            Self::hash_token(&raw),
            self.config.ttl_for(purpose),
        );
        let superseded = self.store.issue_token(token.clone()).await?;
        if superseded > 0 {
            tracing::debug!(
                account_id = %account_id,
                purpose = %purpose,
                superseded,
                "superseded previously active tokens"
            );
        }

        tracing::info!(
            account_id = %account_id,
            purpose = %purpose,
            token_id = %token.id,
            expires_at = %token.expires_at,
            event = "token_issued",
            "issued verification token"
        );

        Ok(IssuedToken { raw, token })
    }

    /// Resolve a presented raw token to its stored record
    ///
    /// The token must exist, match the expected purpose and still be
    /// active; everything else collapses to `InvalidOrExpiredToken` so
    /// the caller learns nothing about which check failed.
    pub async fn resolve(
        &self,
        raw: &str,
        purpose: TokenPurpose,
    ) -> CommandResult<VerificationToken> {
        let token = self
            .store
            .find_token_by_hash(&Self::hash_token(raw))
            .await?
            .ok_or(CommandError::InvalidOrExpiredToken)?;

        if token.purpose != purpose || !token.is_active() {
            return Err(CommandError::InvalidOrExpiredToken);
        }
        Ok(token)
    }
}
