//! MySQL implementation of the credential store.
//!
//! Uniqueness rides on the `uniq_accounts_username` and
//! `uniq_accounts_email` indexes; optimistic concurrency rides on a
//! compare-and-swap against the `version` column. The `consume_token_*`
//! operations mark the token consumed and commit the authorized effect
//! inside one transaction, so concurrent redemptions of the same token
//! resolve to exactly one winner.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row};
use uuid::Uuid;

use users_core::domain::entities::account::Account;
use users_core::domain::entities::verification_token::{TokenPurpose, VerificationToken};
use users_core::errors::{CommandError, CommandResult};
use users_core::repositories::CredentialStore;

/// MySQL ER_DUP_ENTRY
const DUP_ENTRY: &str = "1062";

/// MySQL-backed credential store
pub struct MySqlCredentialStore {
    /// Database connection pool
    pool: MySqlPool,
}

impl MySqlCredentialStore {
    /// Create a new MySQL credential store
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    fn storage(message: impl std::fmt::Display) -> CommandError {
        CommandError::Storage {
            message: message.to_string(),
        }
    }

    /// Map a write failure, turning duplicate-key violations into the
    /// typed conflict on the offending field
    fn write_error(e: sqlx::Error) -> CommandError {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.code().as_deref() == Some(DUP_ENTRY) {
                let message = db_err.message();
                let field = if message.contains("uniq_accounts_email") {
                    "email"
                } else {
                    "username"
                };
                return CommandError::Conflict { field };
            }
        }
        Self::storage(format!("write failed: {}", e))
    }

    fn purpose_str(purpose: TokenPurpose) -> &'static str {
        match purpose {
            TokenPurpose::EmailVerify => "email-verify",
            TokenPurpose::PasswordReset => "password-reset",
        }
    }

    /// Convert database row to Account entity
    fn row_to_account(row: &sqlx::mysql::MySqlRow) -> CommandResult<Account> {
        let id: String = row
            .try_get("id")
            .map_err(|e| Self::storage(format!("failed to get id: {}", e)))?;

        Ok(Account {
            id: Uuid::parse_str(&id)
                .map_err(|e| Self::storage(format!("invalid account UUID: {}", e)))?,
            username: row
                .try_get("username")
                .map_err(|e| Self::storage(format!("failed to get username: {}", e)))?,
            email: row
                .try_get("email")
                .map_err(|e| Self::storage(format!("failed to get email: {}", e)))?,
            email_verified: row
                .try_get("email_verified")
                .map_err(|e| Self::storage(format!("failed to get email_verified: {}", e)))?,
            password_hash: row
                .try_get("password_hash")
                .map_err(|e| Self::storage(format!("failed to get password_hash: {}", e)))?,
            display_name: row
                .try_get("display_name")
                .map_err(|e| Self::storage(format!("failed to get display_name: {}", e)))?,
            bio: row
                .try_get("bio")
                .map_err(|e| Self::storage(format!("failed to get bio: {}", e)))?,
            version: row
                .try_get("version")
                .map_err(|e| Self::storage(format!("failed to get version: {}", e)))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| Self::storage(format!("failed to get created_at: {}", e)))?,
            updated_at: row
                .try_get::<DateTime<Utc>, _>("updated_at")
                .map_err(|e| Self::storage(format!("failed to get updated_at: {}", e)))?,
        })
    }

    /// Convert database row to VerificationToken entity
    fn row_to_token(row: &sqlx::mysql::MySqlRow) -> CommandResult<VerificationToken> {
        let id: String = row
            .try_get("id")
            .map_err(|e| Self::storage(format!("failed to get id: {}", e)))?;

        let account_id: String = row
            .try_get("account_id")
            .map_err(|e| Self::storage(format!("failed to get account_id: {}", e)))?;

        let purpose_str: String = row
            .try_get("purpose")
            .map_err(|e| Self::storage(format!("failed to get purpose: {}", e)))?;

        let purpose = match purpose_str.as_str() {
            "email-verify" => TokenPurpose::EmailVerify,
            "password-reset" => TokenPurpose::PasswordReset,
            other => {
                return Err(Self::storage(format!("unknown token purpose: {}", other)));
            }
        };

        Ok(VerificationToken {
            id: Uuid::parse_str(&id)
                .map_err(|e| Self::storage(format!("invalid token UUID: {}", e)))?,
            account_id: Uuid::parse_str(&account_id)
                .map_err(|e| Self::storage(format!("invalid account UUID: {}", e)))?,
            purpose,
            token_hash: row
                .try_get("token_hash")
                .map_err(|e| Self::storage(format!("failed to get token_hash: {}", e)))?,
            created_at: row
                .try_get::<DateTime<Utc>, _>("created_at")
                .map_err(|e| Self::storage(format!("failed to get created_at: {}", e)))?,
            expires_at: row
                .try_get::<DateTime<Utc>, _>("expires_at")
                .map_err(|e| Self::storage(format!("failed to get expires_at: {}", e)))?,
            consumed_at: row
                .try_get("consumed_at")
                .map_err(|e| Self::storage(format!("failed to get consumed_at: {}", e)))?,
        })
    }

    async fn find_account_where(
        &self,
        condition: &str,
        bind: &str,
    ) -> CommandResult<Option<Account>> {
        let query = format!(
            r#"
            SELECT id, username, email, email_verified, password_hash,
                   display_name, bio, version, created_at, updated_at
            FROM accounts
            WHERE {} = ?
            LIMIT 1
            "#,
            condition
        );

        let result = sqlx::query(&query)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::storage(format!("account lookup failed: {}", e)))?;

        match result {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl CredentialStore for MySqlCredentialStore {
    async fn find_account_by_id(&self, id: Uuid) -> CommandResult<Option<Account>> {
        self.find_account_where("id", &id.to_string()).await
    }

    async fn find_account_by_username(&self, username: &str) -> CommandResult<Option<Account>> {
        self.find_account_where("username", username).await
    }

    async fn find_account_by_email(&self, email: &str) -> CommandResult<Option<Account>> {
        self.find_account_where("email", email).await
    }

    async fn insert_account(&self, account: Account) -> CommandResult<Account> {
        let query = r#"
            INSERT INTO accounts (
                id, username, email, email_verified, password_hash,
                display_name, bio, version, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;

        sqlx::query(query)
            .bind(account.id.to_string())
            .bind(&account.username)
            .bind(&account.email)
            .bind(account.email_verified)
            .bind(&account.password_hash)
            .bind(&account.display_name)
            .bind(&account.bio)
            .bind(account.version)
            .bind(account.created_at)
            .bind(account.updated_at)
            .execute(&self.pool)
            .await
            .map_err(Self::write_error)?;

        Ok(account)
    }

    async fn update_account(
        &self,
        account: Account,
        expected_version: i64,
    ) -> CommandResult<Account> {
        let mut committed = account;
        committed.version = expected_version + 1;

        let query = r#"
            UPDATE accounts
            SET username = ?, email = ?, email_verified = ?, password_hash = ?,
                display_name = ?, bio = ?, version = ?, updated_at = ?
            WHERE id = ? AND version = ?
        "#;

        let result = sqlx::query(query)
            .bind(&committed.username)
            .bind(&committed.email)
            .bind(committed.email_verified)
            .bind(&committed.password_hash)
            .bind(&committed.display_name)
            .bind(&committed.bio)
            .bind(committed.version)
            .bind(committed.updated_at)
            .bind(committed.id.to_string())
            .bind(expected_version)
            .execute(&self.pool)
            .await
            .map_err(Self::write_error)?;

        if result.rows_affected() == 0 {
            // Distinguish a lost race from a vanished account
            return match self.find_account_by_id(committed.id).await? {
                Some(_) => Err(CommandError::VersionConflict),
                None => Err(CommandError::NotFound),
            };
        }

        Ok(committed)
    }

    async fn issue_token(&self, token: VerificationToken) -> CommandResult<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Self::storage(format!("failed to begin transaction: {}", e)))?;

        let now = Utc::now();

        // Supersede and insert in the same transaction; concurrent
        // issuance must never commit two active tokens for one
        // (account, purpose)
        let superseded = sqlx::query(
            r#"
            UPDATE verification_tokens
            SET expires_at = ?
            WHERE account_id = ? AND purpose = ?
              AND consumed_at IS NULL AND expires_at > ?
            "#,
        )
        .bind(now)
        .bind(token.account_id.to_string())
        .bind(Self::purpose_str(token.purpose))
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::storage(format!("failed to invalidate tokens: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO verification_tokens (
                id, account_id, purpose, token_hash,
                created_at, expires_at, consumed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(token.id.to_string())
        .bind(token.account_id.to_string())
        .bind(Self::purpose_str(token.purpose))
        .bind(&token.token_hash)
        .bind(token.created_at)
        .bind(token.expires_at)
        .bind(token.consumed_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::storage(format!("failed to insert token: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| Self::storage(format!("failed to commit: {}", e)))?;

        Ok(superseded.rows_affected())
    }

    async fn find_token_by_hash(
        &self,
        token_hash: &str,
    ) -> CommandResult<Option<VerificationToken>> {
        let query = r#"
            SELECT id, account_id, purpose, token_hash,
                   created_at, expires_at, consumed_at
            FROM verification_tokens
            WHERE token_hash = ?
            LIMIT 1
        "#;

        let result = sqlx::query(query)
            .bind(token_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Self::storage(format!("token lookup failed: {}", e)))?;

        match result {
            Some(row) => Ok(Some(Self::row_to_token(&row)?)),
            None => Ok(None),
        }
    }

    async fn consume_token_and_verify_email(&self, token_id: Uuid) -> CommandResult<Account> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Self::storage(format!("failed to begin transaction: {}", e)))?;

        let now = Utc::now();

        // The consumed_at guard makes redemption first-writer-wins
        let consumed = sqlx::query(
            r#"
            UPDATE verification_tokens
            SET consumed_at = ?
            WHERE id = ? AND purpose = 'email-verify'
              AND consumed_at IS NULL AND expires_at > ?
            "#,
        )
        .bind(now)
        .bind(token_id.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::storage(format!("failed to consume token: {}", e)))?;

        if consumed.rows_affected() == 0 {
            return Err(CommandError::InvalidOrExpiredToken);
        }

        let token_row = sqlx::query("SELECT account_id FROM verification_tokens WHERE id = ?")
            .bind(token_id.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Self::storage(format!("failed to load consumed token: {}", e)))?;

        let account_id: String = token_row
            .try_get("account_id")
            .map_err(|e| Self::storage(format!("failed to get account_id: {}", e)))?;

        sqlx::query(
            r#"
            UPDATE accounts
            SET email_verified = TRUE, version = version + 1, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(now)
        .bind(&account_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::storage(format!("failed to mark email verified: {}", e)))?;

        let account_row = sqlx::query(
            r#"
            SELECT id, username, email, email_verified, password_hash,
                   display_name, bio, version, created_at, updated_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(&account_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| Self::storage(format!("account lookup failed: {}", e)))?
        .ok_or(CommandError::NotFound)?;

        let account = Self::row_to_account(&account_row)?;

        tx.commit()
            .await
            .map_err(|e| Self::storage(format!("failed to commit: {}", e)))?;

        Ok(account)
    }

    async fn consume_token_and_set_password(
        &self,
        token_id: Uuid,
        new_password_hash: &str,
    ) -> CommandResult<Account> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Self::storage(format!("failed to begin transaction: {}", e)))?;

        let now = Utc::now();

        let consumed = sqlx::query(
            r#"
            UPDATE verification_tokens
            SET consumed_at = ?
            WHERE id = ? AND purpose = 'password-reset'
              AND consumed_at IS NULL AND expires_at > ?
            "#,
        )
        .bind(now)
        .bind(token_id.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::storage(format!("failed to consume token: {}", e)))?;

        if consumed.rows_affected() == 0 {
            return Err(CommandError::InvalidOrExpiredToken);
        }

        let token_row = sqlx::query("SELECT account_id FROM verification_tokens WHERE id = ?")
            .bind(token_id.to_string())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| Self::storage(format!("failed to load consumed token: {}", e)))?;

        let account_id: String = token_row
            .try_get("account_id")
            .map_err(|e| Self::storage(format!("failed to get account_id: {}", e)))?;

        sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = ?, version = version + 1, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(new_password_hash)
        .bind(now)
        .bind(&account_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| Self::storage(format!("failed to set password hash: {}", e)))?;

        let account_row = sqlx::query(
            r#"
            SELECT id, username, email, email_verified, password_hash,
                   display_name, bio, version, created_at, updated_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(&account_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| Self::storage(format!("account lookup failed: {}", e)))?
        .ok_or(CommandError::NotFound)?;

        let account = Self::row_to_account(&account_row)?;

        tx.commit()
            .await
            .map_err(|e| Self::storage(format!("failed to commit: {}", e)))?;

        Ok(account)
    }
}
