//! In-memory implementation of the credential store.
//!
//! Backs the test suites and local runs. A single `RwLock` over the
//! whole state gives the same atomicity the MySQL implementation gets
//! from transactions.

use async_trait::async_trait;
use chrono::Utc;
use constant_time_eq::constant_time_eq;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entities::account::Account;
use crate::domain::entities::verification_token::{TokenPurpose, VerificationToken};
use crate::errors::{CommandError, CommandResult};

use super::trait_::CredentialStore;

#[derive(Default)]
struct StoreState {
    accounts: HashMap<Uuid, Account>,
    tokens: HashMap<Uuid, VerificationToken>,
}

/// In-memory credential store
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    state: Arc<RwLock<StoreState>>,
}

impl InMemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing account
    pub async fn seed_account(&self, account: Account) {
        self.state.write().await.accounts.insert(account.id, account);
    }

    /// Snapshot the active tokens held for an account and purpose
    pub async fn active_tokens(&self, account_id: Uuid, purpose: TokenPurpose) -> usize {
        self.state
            .read()
            .await
            .tokens
            .values()
            .filter(|t| t.account_id == account_id && t.purpose == purpose && t.is_active())
            .count()
    }

    fn unique_violation(
        state: &StoreState,
        candidate: &Account,
    ) -> Option<&'static str> {
        for other in state.accounts.values() {
            if other.id == candidate.id {
                continue;
            }
            if other.username == candidate.username {
                return Some("username");
            }
            if other.email == candidate.email {
                return Some("email");
            }
        }
        None
    }

    /// CAS on `consumed_at`: succeeds for exactly one caller per token.
    fn consume_active_token(
        state: &mut StoreState,
        token_id: Uuid,
    ) -> CommandResult<VerificationToken> {
        let token = state
            .tokens
            .get_mut(&token_id)
            .ok_or(CommandError::InvalidOrExpiredToken)?;
        if !token.is_active() {
            return Err(CommandError::InvalidOrExpiredToken);
        }
        token.consumed_at = Some(Utc::now());
        Ok(token.clone())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_account_by_id(&self, id: Uuid) -> CommandResult<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(&id).cloned())
    }

    async fn find_account_by_username(&self, username: &str) -> CommandResult<Option<Account>> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|a| a.username == username)
            .cloned())
    }

    async fn find_account_by_email(&self, email: &str) -> CommandResult<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn insert_account(&self, account: Account) -> CommandResult<Account> {
        let mut state = self.state.write().await;
        if let Some(field) = Self::unique_violation(&state, &account) {
            return Err(CommandError::Conflict { field });
        }
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn update_account(
        &self,
        mut account: Account,
        expected_version: i64,
    ) -> CommandResult<Account> {
        let mut state = self.state.write().await;

        let stored_version = state
            .accounts
            .get(&account.id)
            .map(|a| a.version)
            .ok_or(CommandError::NotFound)?;
        if stored_version != expected_version {
            return Err(CommandError::VersionConflict);
        }
        if let Some(field) = Self::unique_violation(&state, &account) {
            return Err(CommandError::Conflict { field });
        }

        account.version = expected_version + 1;
        state.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn issue_token(&self, token: VerificationToken) -> CommandResult<u64> {
        // Supersede and insert under one write lock; interleaved
        // issuance must never observe two active tokens
        let mut state = self.state.write().await;
        let mut superseded = 0;
        for existing in state.tokens.values_mut() {
            if existing.account_id == token.account_id
                && existing.purpose == token.purpose
                && existing.is_active()
            {
                existing.invalidate();
                superseded += 1;
            }
        }
        state.tokens.insert(token.id, token);
        Ok(superseded)
    }

    async fn find_token_by_hash(
        &self,
        token_hash: &str,
    ) -> CommandResult<Option<VerificationToken>> {
        let state = self.state.read().await;
        Ok(state
            .tokens
            .values()
            .find(|t| constant_time_eq(t.token_hash.as_bytes(), token_hash.as_bytes()))
            .cloned())
    }

    async fn consume_token_and_verify_email(&self, token_id: Uuid) -> CommandResult<Account> {
        let mut state = self.state.write().await;

        let token = Self::consume_active_token(&mut state, token_id)?;
        let account = state
            .accounts
            .get_mut(&token.account_id)
            .ok_or(CommandError::NotFound)?;
        account.mark_email_verified();
        account.version += 1;
        Ok(account.clone())
    }

    async fn consume_token_and_set_password(
        &self,
        token_id: Uuid,
        new_password_hash: &str,
    ) -> CommandResult<Account> {
        let mut state = self.state.write().await;

        let token = Self::consume_active_token(&mut state, token_id)?;
        let account = state
            .accounts
            .get_mut(&token.account_id)
            .ok_or(CommandError::NotFound)?;
        account.set_password_hash(new_password_hash.to_string());
        account.version += 1;
        Ok(account.clone())
    }
}
